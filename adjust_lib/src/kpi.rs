//! KPI service queries.
//!
//! Endpoint layout: `/kpis/v1/<app tokens>[/trackers/<tracker tokens>][/events|/cohorts][.csv]`,
//! with tokens joined by commas.

use crate::client::Client;
use crate::error::{ArgumentError, Error};
use crate::helpers::{parse_date_arg, strip_non_ascii};
use crate::model::KpiResult;
use crate::parse::parse_kpi;
use chrono::NaiveDate;
use serde_json::Value;
use url::Url;

/// Parameters of one KPI service request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KpiQuery {
    pub app_tokens: Vec<String>,
    /// Tracker filter. An empty list adds no `/trackers/` segment.
    pub trackers: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kpis: Vec<String>,
    pub grouping: Vec<String>,
    /// Additional query parameters (`countries`, `sandbox`, `attribution_type`, ...).
    pub extra: Vec<(String, String)>,
}

impl KpiQuery {
    pub fn new<I, S>(app_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            app_tokens: app_tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn trackers<I, S>(mut self, trackers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trackers = Some(trackers.into_iter().map(Into::into).collect());
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn kpis<I, S>(mut self, kpis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kpis = kpis.into_iter().map(Into::into).collect();
        self
    }

    pub fn grouping<I, S>(mut self, grouping: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouping = grouping.into_iter().map(Into::into).collect();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Build a query from loosely typed JSON, e.g. a parameters file.
    ///
    /// `app_tokens`, `trackers`, `kpis` and `grouping` (alias `groups`) must
    /// be lists of strings (`trackers` non-empty), `start_date`/`end_date`
    /// ISO dates. Any other key
    /// becomes an extra query parameter and must hold a scalar. `null` leaves
    /// a parameter unset.
    pub fn from_params(params: &Value) -> Result<Self, ArgumentError> {
        let obj = params
            .as_object()
            .ok_or_else(|| ArgumentError::new("params", "must be an object"))?;
        let mut q = Self::default();
        for (key, value) in obj.iter().filter(|(_, v)| !v.is_null()) {
            match key.as_str() {
                "app_tokens" => q.app_tokens = string_list(key, value)?,
                "trackers" => {
                    let trackers = string_list(key, value)?;
                    if trackers.is_empty() {
                        return Err(ArgumentError::new(key, "must name at least one tracker"));
                    }
                    q.trackers = Some(trackers);
                }
                "kpis" => q.kpis = string_list(key, value)?,
                "grouping" | "groups" => q.grouping = string_list(key, value)?,
                "start_date" => q.start_date = Some(date_value(key, value)?),
                "end_date" => q.end_date = Some(date_value(key, value)?),
                _ => q.extra.push((key.clone(), scalar_value(key, value)?)),
            }
        }
        Ok(q)
    }

    /// Endpoint path below the API base, without the report suffix.
    pub fn path(&self) -> String {
        let mut path = String::from("/kpis/v1");
        if !self.app_tokens.is_empty() {
            path.push('/');
            path.push_str(&join_encoded(&self.app_tokens));
        }
        if let Some(trackers) = self.trackers.as_ref().filter(|t| !t.is_empty()) {
            path.push_str("/trackers/");
            path.push_str(&join_encoded(trackers));
        }
        path
    }

    /// Query parameters. Unset dates and empty lists are omitted; an extra
    /// parameter replaces a built-in one with the same name.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut params = vec![];
        if let Some(d) = self.start_date {
            params.push(("start_date".to_string(), d.to_string()));
        }
        if let Some(d) = self.end_date {
            params.push(("end_date".to_string(), d.to_string()));
        }
        if !self.kpis.is_empty() {
            params.push(("kpis".to_string(), self.kpis.join(",")));
        }
        if !self.grouping.is_empty() {
            params.push(("grouping".to_string(), self.grouping.join(",")));
        }
        params.retain(|(k, _)| !self.extra.iter().any(|(ek, _)| ek == k));
        params.extend(self.extra.iter().cloned());
        params
    }
}

fn join_encoded(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| urlencoding::encode(t).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ArgumentError> {
    let not_list = || ArgumentError::new(key, format!("must be a list of strings, got {}", value));
    value
        .as_array()
        .ok_or_else(not_list)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(not_list))
        .collect()
}

fn date_value(key: &str, value: &Value) -> Result<NaiveDate, ArgumentError> {
    match value.as_str() {
        Some(s) => parse_date_arg(key, s),
        None => Err(ArgumentError::new(key, format!("must be a date, got {}", value))),
    }
}

fn scalar_value(key: &str, value: &Value) -> Result<String, ArgumentError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ArgumentError::new(key, "must be a string, number or boolean")),
    }
}

/// Report flavour of the KPI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Kpis,
    Events,
    Cohorts,
}

impl Report {
    fn suffix(self) -> &'static str {
        match self {
            Report::Kpis => "",
            Report::Events => "/events",
            Report::Cohorts => "/cohorts",
        }
    }
}

/// KPI service bound to a client and a query.
pub struct KpiService<'a> {
    client: &'a Client,
    query: KpiQuery,
}

impl<'a> KpiService<'a> {
    pub(crate) fn new(client: &'a Client, query: KpiQuery) -> Self {
        Self { client, query }
    }

    pub fn query(&self) -> &KpiQuery {
        &self.query
    }

    pub fn fetch_kpi(&self) -> Result<KpiResult, Error> {
        self.fetch(Report::Kpis)
    }

    pub fn fetch_events(&self) -> Result<KpiResult, Error> {
        self.fetch(Report::Events)
    }

    pub fn fetch_cohorts(&self) -> Result<KpiResult, Error> {
        self.fetch(Report::Cohorts)
    }

    pub fn fetch_kpi_csv(&self) -> Result<String, Error> {
        self.fetch_csv(Report::Kpis)
    }

    pub fn fetch_events_csv(&self) -> Result<String, Error> {
        self.fetch_csv(Report::Events)
    }

    pub fn fetch_cohorts_csv(&self) -> Result<String, Error> {
        self.fetch_csv(Report::Cohorts)
    }

    /// Fetch a report as a typed [`KpiResult`].
    pub fn fetch(&self, report: Report) -> Result<KpiResult, Error> {
        let url = self.url(report, false)?;
        let res = self.client.get(&url, &self.query.query())?;
        parse_kpi(&res)
    }

    /// Fetch a report from the `.csv` endpoint. Non-ASCII characters are
    /// dropped from the body.
    pub fn fetch_csv(&self, report: Report) -> Result<String, Error> {
        let url = self.url(report, true)?;
        let res = self.client.get(&url, &self.query.query())?;
        res.error_for_status()?;
        let (csv, removed) = strip_non_ascii(res.text());
        if removed > 0 {
            tracing::warn!(removed, "dropped non-ASCII characters from CSV report");
        }
        Ok(csv)
    }

    pub fn url(&self, report: Report, csv: bool) -> Result<Url, Error> {
        let mut path = self.query.path();
        path.push_str(report.suffix());
        if csv {
            path.push_str(".csv");
        }
        self.client.url(&path)
    }
}
