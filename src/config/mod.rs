use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote API.
    pub api: ApiConfig,
    /// Local database.
    pub database: DatabaseConfig,
    /// Log output.
    pub logging: LoggingConfig,
    /// Request defaults.
    pub request: RequestConfig,
    /// Session tracking.
    pub tracking: TrackingConfig,
}

/// Remote analytics API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer key, if any.
    pub api_key: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: PathBuf,
    /// Pool size.
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// HTTP request configuration
///
/// `timeout_ms` and `max_retries` are the defaults applied to every request
/// that does not override them. The delay before retry `k` is
/// `backoff_base_ms * 2^k`.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-attempt timeout.
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff base delay.
    pub backoff_base_ms: u64,
}

/// Session tracking configuration
#[derive(Debug, Clone, Default)]
pub struct TrackingConfig {
    /// When set, an active session idle for longer than this is dropped on the
    /// next `start`. `None` keeps sessions active until completed.
    pub session_inactivity_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = env::var("TRACKING_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());
        if base_url.trim().is_empty() {
            return Err(AppError::Config {
                message: "TRACKING_API_BASE_URL cannot be empty".to_string(),
            });
        }

        let api = ApiConfig {
            base_url,
            api_key: env::var("TRACKING_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/tracking.db".to_string()),
            ),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let defaults = RequestConfig::default();
        let request = RequestConfig {
            timeout_ms: parse_env("REQUEST_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            max_retries: parse_env("MAX_RETRIES").unwrap_or(defaults.max_retries),
            backoff_base_ms: parse_env("RETRY_BACKOFF_BASE_MS")
                .unwrap_or(defaults.backoff_base_ms),
        };

        let tracking = TrackingConfig {
            session_inactivity_timeout: parse_env::<u64>("SESSION_INACTIVITY_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        Ok(Config {
            api,
            database,
            logging,
            request,
            tracking,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15000,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_config_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.timeout_ms, 15000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base_ms, 1000);
    }

    #[test]
    fn test_tracking_config_default_keeps_sessions_open() {
        assert!(TrackingConfig::default().session_inactivity_timeout.is_none());
    }
}
