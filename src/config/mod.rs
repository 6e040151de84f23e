//! Configuration module for the portfolio sync layer.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;

use url::Url;

use crate::errors::SyncError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin; `None` leaves the remote client unconfigured
    pub backend_url: Option<Url>,
    /// Path to the SQLite file backing local storage
    pub store_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format (text or json)
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, SyncError> {
        dotenvy::dotenv().ok();

        let backend_url = match env::var("PORTFOLIO_BACKEND_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_backend_url(raw.trim())?),
            _ => None,
        };

        let store_path = env::var("PORTFOLIO_STORE_PATH")
            .unwrap_or_else(|_| "./data/local.sqlite".to_string())
            .into();

        let log_level = env::var("PORTFOLIO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("PORTFOLIO_LOG_FORMAT") {
            Ok(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            backend_url,
            store_path,
            log_level,
            log_format,
        })
    }
}

/// Parse a backend origin, rejecting anything that cannot be a base URL.
pub fn parse_backend_url(raw: &str) -> Result<Url, SyncError> {
    let url = Url::parse(raw).map_err(|e| {
        SyncError::Config(format!("Invalid PORTFOLIO_BACKEND_URL '{}': {}", raw, e))
    })?;
    if url.cannot_be_a_base() {
        return Err(SyncError::Config(format!(
            "PORTFOLIO_BACKEND_URL '{}' cannot be used as a base URL",
            raw
        )));
    }
    Ok(url)
}
