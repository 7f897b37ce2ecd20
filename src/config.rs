//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REGISTRO_BASE_URL` - Address of the sales server (unless `--base-url` is given)
//!
//! ## Optional
//! - `REGISTRO_DOWNLOAD_DIR` - Where report PDFs are saved (default: ./downloads)
//! - `REGISTRO_LOG_DIR` - Rolling log directory (default: platform data dir)
//! - `REGISTRO_STATS_REFRESH_SECS` - Quick stats refresh period (default: 300)
//! - `REGISTRO_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::api::DEFAULT_TIMEOUT;
use crate::diagnostics;
use crate::reports::DEFAULT_STATS_REFRESH;

pub const ENV_BASE_URL: &str = "REGISTRO_BASE_URL";
pub const ENV_DOWNLOAD_DIR: &str = "REGISTRO_DOWNLOAD_DIR";
pub const ENV_LOG_DIR: &str = "REGISTRO_LOG_DIR";
pub const ENV_STATS_REFRESH_SECS: &str = "REGISTRO_STATS_REFRESH_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REGISTRO_REQUEST_TIMEOUT_SECS";

const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Values given on the command line. They take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub download_dir: PathBuf,
    pub log_dir: PathBuf,
    pub stats_refresh: Duration,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(Overrides::default())
    }

    /// Like [`Self::from_env`], with command line values applied on top.
    pub fn from_env_with(overrides: Overrides) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = match overrides.base_url {
            Some(url) => url,
            None => get(ENV_BASE_URL).ok_or_else(|| ConfigError::MissingEnvVar(ENV_BASE_URL.to_string()))?,
        };
        let download_dir = overrides
            .download_dir
            .or_else(|| get(ENV_DOWNLOAD_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
        let log_dir = get(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(diagnostics::default_log_dir);
        let stats_refresh = positive_secs(ENV_STATS_REFRESH_SECS, get(ENV_STATS_REFRESH_SECS))?
            .unwrap_or(DEFAULT_STATS_REFRESH);
        let request_timeout =
            positive_secs(ENV_REQUEST_TIMEOUT_SECS, get(ENV_REQUEST_TIMEOUT_SECS))?
                .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            base_url,
            download_dir,
            log_dir,
            stats_refresh,
            request_timeout,
        })
    }
}

/// Parse a whole number of seconds greater than zero.
fn positive_secs(key: &str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Some(Duration::from_secs(secs)))
}
