//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATE_FILE: &str = ".cinema-session.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub state_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeouts: Timeouts::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CINEMA_API_BASE_URL`: default `http://localhost:8080/api`
    /// - `CINEMA_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CINEMA_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CINEMA_STATE_FILE`: default `.cinema-session.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or a timeout is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            std::env::var("CINEMA_API_BASE_URL")
                .ok()
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let timeouts = Timeouts {
            request_secs: env_parse_secs("CINEMA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("CINEMA_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let state_file = std::env::var("CINEMA_STATE_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from);

        Ok(Self { base_url, timeouts, state_file })
    }
}

/// Trim trailing slashes and require an http(s) scheme.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for empty or non-http(s) values.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Parse(format!("base URL must start with http:// or https://: {raw}")));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Parse(format!("{key} must be a positive integer, got '{raw}'"))),
        Ok(secs) => Ok(secs),
    }
}
