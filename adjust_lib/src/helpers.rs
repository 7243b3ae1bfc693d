//! Helpers for user-token resolution and argument parsing.

use crate::error::ArgumentError;
use chrono::NaiveDate;

/// Environment variable holding the user token.
pub const USER_TOKEN_ENV: &str = "ADJUST_USER_TOKEN";

/// Where the user token came from (for diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Passed in by the caller (`Config::with_token`).
    Explicit,
    Env,
    OnePassword,
    Bitwarden,
}

/// Resolve the Adjust user token.
///
/// Order: `ADJUST_USER_TOKEN`, then 1Password, then Bitwarden (see [crate::secret]).
pub fn get_user_token() -> Result<(String, TokenSource), String> {
    if let Ok(k) = std::env::var(USER_TOKEN_ENV) {
        let k = k.trim();
        if !k.is_empty() {
            return Ok((k.to_string(), TokenSource::Env));
        }
    }
    if let Some(k) = crate::secret::one_password() {
        return Ok((k, TokenSource::OnePassword));
    }
    if let Some(k) = crate::secret::bitwarden() {
        return Ok((k, TokenSource::Bitwarden));
    }
    Err(format!(
        "User token not found. Set {} or configure a secret backend: \
         ADJUST_OP_ENTRY_PATH (1Password) or ADJUST_BW_ITEM_ID (Bitwarden).",
        USER_TOKEN_ENV
    ))
}

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_date_arg(argument: &str, s: &str) -> Result<NaiveDate, ArgumentError> {
    crate::model::parse_date(s).ok_or_else(|| {
        ArgumentError::new(argument, format!("must be a date (YYYY-MM-DD), got `{}`", s))
    })
}

/// Split a comma separated list, dropping blanks.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Drop every non-ASCII character. Returns the cleaned text and how many
/// characters were removed.
pub fn strip_non_ascii(s: &str) -> (String, usize) {
    let cleaned: String = s.chars().filter(char::is_ascii).collect();
    let removed = s.chars().count() - cleaned.chars().count();
    (cleaned, removed)
}
