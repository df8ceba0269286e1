//! Client configuration parsed from environment variables.
//!
//! The base URL resolves in order: `MATH_API_BASE_URL` at runtime, the same
//! variable captured at build time, then the loopback default. Blank values
//! count as unset.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_RECENT_LIMIT: usize = 50;

pub const BASE_URL_VAR: &str = "MATH_API_BASE_URL";
pub const RECENT_LIMIT_VAR: &str = "MATH_RECENT_LIMIT";
pub const REQUEST_TIMEOUT_VAR: &str = "MATH_REQUEST_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_VAR: &str = "MATH_CONNECT_TIMEOUT_SECS";

const BUILD_BASE_URL: Option<&str> = option_env!("MATH_API_BASE_URL");

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL {value:?}: expected an absolute http(s) URL")]
    InvalidBaseUrl { value: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Transport timeouts. `None` leaves reqwest's default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Option<Duration>,
    pub connect: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub recent_limit: usize,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from the process environment.
    ///
    /// Optional:
    /// - `MATH_API_BASE_URL`: backend base URL
    /// - `MATH_RECENT_LIMIT`: history entries loaded at startup (default 50)
    /// - `MATH_REQUEST_TIMEOUT_SECS`: whole-request timeout
    /// - `MATH_CONNECT_TIMEOUT_SECS`: connect timeout
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a value is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_base = get(BASE_URL_VAR)
            .or_else(|| BUILD_BASE_URL.filter(|v| !v.trim().is_empty()).map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let base_url = normalize_base_url(&raw_base)?;

        let recent_limit = match get(RECENT_LIMIT_VAR) {
            Some(raw) => parse_number(RECENT_LIMIT_VAR, &raw)?,
            None => DEFAULT_RECENT_LIMIT,
        };
        let timeouts = Timeouts {
            request: parse_secs(REQUEST_TIMEOUT_VAR, get(REQUEST_TIMEOUT_VAR))?,
            connect: parse_secs(CONNECT_TIMEOUT_VAR, get(CONNECT_TIMEOUT_VAR))?,
        };

        Ok(Self { base_url, recent_limit, timeouts })
    }

    /// Replace the base URL, e.g. from a `--base-url` flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `raw` is not an http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw)?;
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = || ConfigError::InvalidBaseUrl { value: raw.to_owned() };
    let url = reqwest::Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(invalid());
    }
    Ok(trimmed.to_owned())
}

fn parse_number(var: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidNumber { var, value: raw.to_owned() })
}

fn parse_secs(var: &'static str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    raw.map(|raw| parse_number(var, &raw).map(|secs| Duration::from_secs(secs as u64)))
        .transpose()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
