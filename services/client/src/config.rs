//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub log_level: Level,
    pub token_path: PathBuf,
    pub request_timeout: Duration,
    pub request_attempts: usize,
    pub activity_log_limit: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Backend Settings ---
        let raw_base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let api_base_url = normalize_base_url(&raw_base_url)
            .map_err(|reason| ConfigError::InvalidValue("API_BASE_URL".to_string(), reason))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let token_path = std::env::var("TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.mail_router_token"));

        // --- Transport Settings ---
        let timeout_ms: u64 = parse_var("REQUEST_TIMEOUT_MS", 10_000)?;
        let request_attempts: usize = parse_var("REQUEST_ATTEMPTS", 2)?;
        if request_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "REQUEST_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let activity_log_limit: u32 = parse_var("ACTIVITY_LOG_LIMIT", 50)?;

        Ok(Self {
            api_base_url,
            log_level,
            token_path,
            request_timeout: Duration::from_millis(timeout_ms),
            request_attempts,
            activity_log_limit,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Trims whitespace and trailing slashes and insists on an http(s) URL with a host.
pub fn normalize_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("base url must not be empty".to_string());
    }
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err("base url must include a scheme".to_string());
    };
    if scheme != "http" && scheme != "https" {
        return Err(format!("unsupported scheme '{}'", scheme));
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err("base url must include a host".to_string());
    }
    Ok(trimmed.to_string())
}
