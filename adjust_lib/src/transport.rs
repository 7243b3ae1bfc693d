//! HTTP transport boundary.
//!
//! The client never talks to `reqwest` directly; it hands a fully built URL,
//! query and headers to a [`Transport`] and gets an [`HttpResponse`] back.
//! Tests swap in an in-memory transport.

use crate::error::{Error, HttpError, ValidationError, ValidationErrorKind};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx status into an [`HttpError`].
    pub fn error_for_status(&self) -> Result<(), HttpError> {
        if self.is_success() {
            return Ok(());
        }
        let data: Option<Value> = serde_json::from_str(&self.body).ok();
        let message = if self.status == 401 {
            "Authentication failed. Check your user token.".to_string()
        } else {
            data.as_ref()
                .and_then(|d| d.get("error").or_else(|| d.get("message")))
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| "API request failed".to_string())
        };
        Err(HttpError::new(self.status, message, data))
    }

    /// Decoded JSON body.
    pub fn json(&self) -> Result<Value, ValidationError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ValidationError::new(ValidationErrorKind::MalformedJson, "", e.to_string())
        })
    }

    pub fn text(&self) -> &str {
        &self.body
    }
}

/// Performs one blocking HTTP call per invocation.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &Url,
        query: &[(String, String)],
        headers: &HeaderMap,
    ) -> Result<HttpResponse, Error>;

    fn post(&self, url: &Url, body: &Value, headers: &HeaderMap) -> Result<HttpResponse, Error>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    fn finish(res: reqwest::blocking::Response) -> Result<HttpResponse, Error> {
        let status = res.status().as_u16();
        let body = res.text().map_err(|e| Error::Transport(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn get(
        &self,
        url: &Url,
        query: &[(String, String)],
        headers: &HeaderMap,
    ) -> Result<HttpResponse, Error> {
        let mut full = url.clone();
        if !query.is_empty() {
            full.query_pairs_mut().extend_pairs(query);
        }
        let res = self
            .http
            .get(full)
            .headers(headers.clone())
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Self::finish(res)
    }

    fn post(&self, url: &Url, body: &Value, headers: &HeaderMap) -> Result<HttpResponse, Error> {
        let res = self
            .http
            .post(url.clone())
            .headers(headers.clone())
            .json(body)
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Self::finish(res)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// A request captured by [`RecordingTransport`].
    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub method: &'static str,
        pub url: String,
        pub query: Vec<(String, String)>,
        pub headers: HeaderMap,
        pub body: Option<Value>,
    }

    /// Replays queued responses and records every request.
    pub(crate) struct RecordingTransport {
        pub responses: Mutex<Vec<HttpResponse>>,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl RecordingTransport {
        pub fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        fn next(&self) -> Result<HttpResponse, Error> {
            let mut q = self.responses.lock().unwrap();
            if q.is_empty() {
                return Err(Error::Transport("no response queued".to_string()));
            }
            Ok(q.remove(0))
        }
    }

    impl Transport for RecordingTransport {
        fn get(
            &self,
            url: &Url,
            query: &[(String, String)],
            headers: &HeaderMap,
        ) -> Result<HttpResponse, Error> {
            self.requests.lock().unwrap().push(Recorded {
                method: "GET",
                url: url.to_string(),
                query: query.to_vec(),
                headers: headers.clone(),
                body: None,
            });
            self.next()
        }

        fn post(&self, url: &Url, body: &Value, headers: &HeaderMap) -> Result<HttpResponse, Error> {
            self.requests.lock().unwrap().push(Recorded {
                method: "POST",
                url: url.to_string(),
                query: Vec::new(),
                headers: headers.clone(),
                body: Some(body.clone()),
            });
            self.next()
        }
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn error_for_status_uses_body_message() {
        let body = json!({"error": "Invalid app token"}).to_string();
        let err = HttpResponse::new(404, body).error_for_status().unwrap_err();
        assert_eq!(err.status, 404);
        assert_eq!(err.message, "Invalid app token");
        assert!(err.body.is_some());
    }

    #[test]
    fn error_for_status_unauthorized_hint() {
        let err = HttpResponse::new(401, "nope").error_for_status().unwrap_err();
        assert!(err.message.contains("user token"));
        assert!(err.body.is_none());
    }

    #[test]
    fn json_rejects_non_json_body() {
        let err = HttpResponse::new(200, "<html>").json().unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MalformedJson);
    }
}
