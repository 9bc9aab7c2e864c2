//! Client configuration for the district admin backend.
//!
//! # Responsibility
//! - Describe where the admin API lives and how long one call may take.
//! - Load configuration from environment variables or a JSON document.
//!
//! # Invariants
//! - A validated config always has an absolute http(s) base URL without a
//!   trailing slash.
//! - The request timeout is never zero; every remote call is bounded.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Environment variable holding the admin API base URL.
pub const ENV_API_BASE_URL: &str = "LOCREG_API_BASE_URL";
/// Environment variable holding the per-request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "LOCREG_REQUEST_TIMEOUT_MS";
/// Environment variable holding the log level.
pub const ENV_LOG_LEVEL: &str = "LOCREG_LOG_LEVEL";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingValue(&'static str),
    InvalidBaseUrl(String),
    InvalidTimeout(String),
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingValue(key) => write!(f, "missing configuration value `{key}`"),
            Self::InvalidBaseUrl(value) => {
                write!(f, "api base url must be an absolute http(s) url, got `{value}`")
            }
            Self::InvalidTimeout(value) => {
                write!(f, "request timeout must be a positive integer, got `{value}`")
            }
            Self::Parse(message) => write!(f, "invalid configuration document: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for talking to the district admin backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://admin.example.com`. Endpoint paths are appended.
    pub api_base_url: String,
    /// Upper bound for one remote call, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// `trace|debug|info|warn|error`.
    #[serde(default = "default_level_string")]
    pub log_level: String,
}

impl ClientConfig {
    /// Creates a config with default timeout and log level.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_level: default_level_string(),
        }
    }

    /// Loads and validates configuration from `LOCREG_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validated()
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_API_BASE_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingValue(ENV_API_BASE_URL))?;
        let mut config = Self::new(base_url);

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout_ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
            config.log_level = level;
        }
        config.validated()
    }

    /// Validates and normalizes this config.
    ///
    /// # Errors
    /// - `InvalidBaseUrl` unless the URL starts with `http://` or `https://`
    ///   and has a host part.
    /// - `InvalidTimeout` when the timeout is zero.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/').to_string();
        let host = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"));
        match host {
            Some(rest) if !rest.is_empty() => {}
            _ => return Err(ConfigError::InvalidBaseUrl(self.api_base_url)),
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }
        self.api_base_url = trimmed;
        Ok(self)
    }
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_level_string() -> String {
    default_log_level().to_string()
}
