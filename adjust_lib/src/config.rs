//! Client configuration from the environment.

use crate::error::Error;
use crate::helpers::{get_user_token, TokenSource};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.adjust.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    pub user_token: String,
    pub token_source: TokenSource,
    pub api_base: String,
    pub timeout: Duration,
}

impl Config {
    /// Read `ADJUST_API_BASE`, `ADJUST_TIMEOUT_SECS` and resolve the user token.
    pub fn from_env() -> Result<Self, Error> {
        let (user_token, token_source) = get_user_token().map_err(Error::Config)?;
        let api_base = parse_api_base(std::env::var("ADJUST_API_BASE").ok().as_deref())?;
        let timeout = parse_timeout(std::env::var("ADJUST_TIMEOUT_SECS").ok().as_deref())?;
        Ok(Self {
            user_token,
            token_source,
            api_base,
            timeout,
        })
    }

    /// Configuration with defaults and an explicit token.
    pub fn with_token(user_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
            token_source: TokenSource::Explicit,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn parse_api_base(raw: Option<&str>) -> Result<String, Error> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_API_BASE.to_string()),
        Some(s) => {
            Url::parse(s).map_err(|e| {
                Error::Config(format!("ADJUST_API_BASE `{}` is not a URL: {}", s, e))
            })?;
            Ok(s.trim_end_matches('/').to_string())
        }
    }
}

fn parse_timeout(raw: Option<&str>) -> Result<Duration, Error> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(s) => s.parse::<u64>().map(Duration::from_secs).map_err(|_| {
            Error::Config(format!("ADJUST_TIMEOUT_SECS `{}` is not a number of seconds", s))
        }),
    }
}
