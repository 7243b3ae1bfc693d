//! Response parsers: raw HTTP response in, validated records out.

use crate::error::Error;
use crate::model::{App, AppsResponse, KpiResult};
use crate::transport::HttpResponse;

/// Validate an apps listing. An account without apps yields an empty list.
pub fn parse_apps(response: &HttpResponse) -> Result<Vec<App>, Error> {
    response.error_for_status()?;
    let apps = AppsResponse::from_json(&response.json()?, "")?.apps;
    if apps.is_empty() {
        tracing::info!("Didn't find applications in your account");
    } else {
        tracing::info!(count = apps.len(), "Found applications in your account");
    }
    Ok(apps)
}

/// Validate a KPI service response.
///
/// A failure status is reported before the body is looked at. Shape
/// inference is left to the caller (see [`crate::shape`]).
pub fn parse_kpi(response: &HttpResponse) -> Result<KpiResult, Error> {
    response.error_for_status()?;
    let kpi = KpiResult::from_json(&response.json()?, "")?;
    tracing::debug!(
        kpis = kpi.result_parameters.kpis.len(),
        grouping = ?kpi.result_parameters.grouping,
        "parsed KPI result"
    );
    Ok(kpi)
}
