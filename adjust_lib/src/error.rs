//! Error types for the Adjust API client.

use std::fmt;
use thiserror::Error;

/// Base error type for Adjust operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Raised when the API answers with a non-2xx status.
#[derive(Error, Debug)]
#[error("{message} (status {status})")]
pub struct HttpError {
    pub status: u16,
    pub message: String,
    pub body: Option<serde_json::Value>,
}

impl HttpError {
    pub fn new(status: u16, message: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            status,
            message: message.into(),
            body,
        }
    }
}

/// What went wrong while validating a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingField,
    TypeMismatch,
    MalformedDate,
    /// The body was not JSON at all.
    MalformedJson,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationErrorKind::MissingField => "missing required field",
            ValidationErrorKind::TypeMismatch => "type mismatch",
            ValidationErrorKind::MalformedDate => "malformed date",
            ValidationErrorKind::MalformedJson => "malformed JSON",
        };
        f.write_str(s)
    }
}

/// Raised when a JSON payload does not match the expected schema.
///
/// `path` is the dotted location of the offending field, e.g.
/// `apps[2].currency.iso_code`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at `{path}`: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn missing(path: &str) -> Self {
        Self::new(ValidationErrorKind::MissingField, path, "field is required")
    }

    pub fn mismatch(path: &str, expected: &str, found: &serde_json::Value) -> Self {
        Self::new(
            ValidationErrorKind::TypeMismatch,
            path,
            format!("expected {}, found {}", expected, json_type_name(found)),
        )
    }
}

/// Raised synchronously when a caller passes a wrongly typed or invalid argument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{argument}` {message}")]
pub struct ArgumentError {
    pub argument: String,
    pub message: String,
}

impl ArgumentError {
    pub fn new(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            argument: argument.into(),
            message: message.into(),
        }
    }
}

pub(crate) fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_error_display_names_path_and_kind() {
        let e = ValidationError::mismatch("apps[0].id", "integer", &json!("x"));
        let msg = e.to_string();
        assert!(msg.contains("type mismatch"));
        assert!(msg.contains("apps[0].id"));
        assert!(msg.contains("found string"));
    }

    #[test]
    fn errors_convert_into_base_error() {
        let e: Error = ArgumentError::new("kpis", "must be a list").into();
        assert!(matches!(e, Error::Argument(_)));
        let e: Error = HttpError::new(500, "boom", None).into();
        assert!(e.to_string().contains("500"));
    }
}
