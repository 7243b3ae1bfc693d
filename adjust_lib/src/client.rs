//! Blocking HTTP client for the Adjust dashboard and KPI APIs.

use crate::config::Config;
use crate::error::{ArgumentError, Error};
use crate::kpi::{KpiQuery, KpiService};
use crate::model::App;
use crate::parse::parse_apps;
use crate::transport::{HttpResponse, ReqwestTransport, Transport};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Adjust API client.
#[derive(Clone)]
pub struct Client {
    user_token: String,
    api_base: String,
    user_agent: String,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client for the public API with the given user token.
    pub fn new(user_token: impl Into<String>) -> Result<Self, Error> {
        Self::from_config(Config::with_token(user_token))
    }

    pub fn from_config(config: Config) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(
            config.user_token,
            config.api_base,
            Arc::new(transport),
        ))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        user_token: impl Into<String>,
        api_base: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            user_token: user_token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            user_agent: format!("adjust-cli/{}", crate::VERSION),
            transport,
        }
    }

    /// List all applications in the account.
    pub fn list_apps(&self) -> Result<Vec<App>, Error> {
        let url = self.url("/dashboard/api/apps")?;
        let res = self.get(&url, &[])?;
        parse_apps(&res)
    }

    /// Get a single application by app token, as returned by the API.
    pub fn get_app(&self, app_token: &str) -> Result<Value, Error> {
        let url = self.url(&format!(
            "/dashboard/api/apps/{}",
            urlencoding::encode(app_token)
        ))?;
        self.get_json(&url)
    }

    /// Raw export settings of an app.
    pub fn get_raw_export_settings(&self, app_token: &str) -> Result<Value, Error> {
        let url = self.raw_export_settings_url(app_token)?;
        self.get_json(&url)
    }

    /// Update raw export settings.
    ///
    /// `settings` must be the object returned by [`Client::get_raw_export_settings`]
    /// (possibly edited). Its `hash` is dropped and its `columns` list is
    /// replaced by the comma separated `csv_definition` the endpoint expects.
    pub fn update_raw_export_settings(
        &self,
        app_token: &str,
        settings: Value,
    ) -> Result<Value, Error> {
        let body = prepare_raw_export_settings(settings)?;
        let url = self.raw_export_settings_url(app_token)?;
        let mut headers = self.auth()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        tracing::debug!(method = "POST", url = %url, "adjust request");
        let res = self.transport.post(&url, &body, &headers)?;
        res.error_for_status()?;
        Ok(res.json()?)
    }

    /// Callbacks configured for an app.
    pub fn list_callbacks(&self, app_token: &str) -> Result<Value, Error> {
        let url = self.url(&format!(
            "/dashboard/api/apps/{}/callbacks",
            urlencoding::encode(app_token)
        ))?;
        self.get_json(&url)
    }

    /// KPI service bound to `query`.
    pub fn kpi_service(&self, query: KpiQuery) -> KpiService<'_> {
        KpiService::new(self, query)
    }

    fn raw_export_settings_url(&self, app_token: &str) -> Result<Url, Error> {
        self.url(&format!(
            "/dashboard/api/apps/{}/settings/raw_export_settings",
            urlencoding::encode(app_token)
        ))
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let raw = format!("{}{}", self.api_base, path);
        Url::parse(&raw).map_err(|e| Error::Config(format!("invalid request URL {}: {}", raw, e)))
    }

    pub(crate) fn get(&self, url: &Url, query: &[(String, String)]) -> Result<HttpResponse, Error> {
        let params: Vec<&str> = query.iter().map(|(k, _)| k.as_str()).collect();
        tracing::debug!(method = "GET", url = %url, params = ?params, "adjust request");
        let res = self.transport.get(url, query, &self.auth()?)?;
        tracing::debug!(status = res.status, bytes = res.body.len(), "adjust response");
        Ok(res)
    }

    fn get_json(&self, url: &Url) -> Result<Value, Error> {
        let res = self.get(url, &[])?;
        res.error_for_status()?;
        Ok(res.json()?)
    }

    fn auth(&self) -> Result<HeaderMap, Error> {
        let mut token = HeaderValue::from_str(&format!("Token token={}", self.user_token))
            .map_err(|_| {
                ArgumentError::new("user_token", "contains characters not allowed in a header")
            })?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|_| Error::Config("invalid user agent".to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

fn prepare_raw_export_settings(mut settings: Value) -> Result<Value, ArgumentError> {
    let inner = settings
        .get_mut("raw_export_settings")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ArgumentError::new(
                "settings",
                "must come from get_raw_export_settings and contain a `raw_export_settings` object",
            )
        })?;
    inner.remove("hash");
    let columns = inner
        .remove("columns")
        .ok_or_else(|| ArgumentError::new("settings", "has no `raw_export_settings.columns`"))?;
    let columns = columns
        .as_array()
        .ok_or_else(|| ArgumentError::new("settings", "`columns` must be a list"))?;
    let values = columns
        .iter()
        .map(|c| {
            c.get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| ArgumentError::new("settings", "every column needs a string `value`"))
        })
        .collect::<Result<Vec<&str>, _>>()?;
    let csv_definition = values.join(",");
    inner.insert("csv_definition".to_string(), Value::String(csv_definition));
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::app_json;
    use crate::transport::tests::RecordingTransport;
    use serde_json::json;

    fn client(responses: Vec<HttpResponse>) -> (Client, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new(responses));
        let client = Client::with_transport("s3cret", "https://api.example.test/", transport.clone());
        (client, transport)
    }

    #[test]
    fn list_apps_sends_token_header() {
        let body = json!({"apps": [app_json()]}).to_string();
        let (c, t) = client(vec![HttpResponse::new(200, body)]);
        let apps = c.list_apps().unwrap();
        assert_eq!(apps.len(), 1);
        let req = &t.requests()[0];
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "https://api.example.test/dashboard/api/apps");
        assert_eq!(req.headers[AUTHORIZATION], "Token token=s3cret");
        assert_eq!(req.headers[ACCEPT], "application/json");
        assert!(req.headers[USER_AGENT].to_str().unwrap().starts_with("adjust-cli/"));
    }

    #[test]
    fn get_app_encodes_token() {
        let (c, t) = client(vec![HttpResponse::new(200, r#"{"name":"Demo"}"#)]);
        let app = c.get_app("ab c").unwrap();
        assert_eq!(app["name"], json!("Demo"));
        assert_eq!(t.requests()[0].url, "https://api.example.test/dashboard/api/apps/ab%20c");
    }

    #[test]
    fn failure_status_is_http_error() {
        let (c, _) = client(vec![HttpResponse::new(404, r#"{"error":"App not found"}"#)]);
        match c.list_callbacks("abc").unwrap_err() {
            Error::Http(e) => {
                assert_eq!(e.status, 404);
                assert_eq!(e.message, "App not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn update_raw_export_settings_rewrites_columns() {
        let (c, t) = client(vec![HttpResponse::new(200, r#"{"ok":true}"#)]);
        let settings = json!({
            "raw_export_settings": {
                "hash": "deadbeef",
                "enabled": true,
                "columns": [{"value": "{app_id}"}, {"value": "{tracker}"}]
            }
        });
        let out = c.update_raw_export_settings("abc", settings).unwrap();
        assert_eq!(out["ok"], json!(true));
        let req = &t.requests()[0];
        assert_eq!(req.method, "POST");
        assert_eq!(
            req.url,
            "https://api.example.test/dashboard/api/apps/abc/settings/raw_export_settings"
        );
        assert_eq!(req.headers[CONTENT_TYPE], "application/json");
        let body = req.body.as_ref().unwrap();
        assert_eq!(
            body,
            &json!({"raw_export_settings": {"enabled": true, "csv_definition": "{app_id},{tracker}"}})
        );
    }

    #[test]
    fn update_raw_export_settings_requires_wrapper() {
        let (c, t) = client(vec![]);
        let err = c
            .update_raw_export_settings("abc", json!({"columns": []}))
            .unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
        assert!(t.requests().is_empty());
    }

    #[test]
    fn header_unsafe_token_is_argument_error() {
        let transport = Arc::new(RecordingTransport::new(vec![]));
        let c = Client::with_transport("bad\ntoken", "https://api.example.test", transport.clone());
        assert!(matches!(c.list_apps().unwrap_err(), Error::Argument(_)));
        assert!(transport.requests().is_empty());
    }
}
