//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use mindful_tracking::config::{Config, LogFormat};
use serial_test::serial;
use std::env;
use std::time::Duration;

#[test]
#[serial]
fn test_config_from_env_loads_successfully() {
    let result = Config::from_env();
    assert!(result.is_ok(), "Config::from_env() should succeed on defaults");
}

#[test]
#[serial]
fn test_config_from_env_custom_base_url() {
    env::set_var("TRACKING_API_BASE_URL", "https://custom.api.com");

    let config = Config::from_env().unwrap();
    assert_eq!(config.api.base_url, "https://custom.api.com");

    env::remove_var("TRACKING_API_BASE_URL");
}

#[test]
#[serial]
fn test_config_empty_base_url_is_rejected() {
    env::set_var("TRACKING_API_BASE_URL", "  ");

    let result = Config::from_env();
    assert!(result.is_err());

    env::remove_var("TRACKING_API_BASE_URL");
}

#[test]
#[serial]
fn test_config_blank_api_key_is_none() {
    env::set_var("TRACKING_API_KEY", "");

    let config = Config::from_env().unwrap();
    assert!(config.api.api_key.is_none());

    env::remove_var("TRACKING_API_KEY");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    env::set_var("DATABASE_PATH", "/custom/path.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.database.max_connections, 10);

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_from_env_custom_request() {
    env::set_var("REQUEST_TIMEOUT_MS", "60000");
    env::set_var("MAX_RETRIES", "5");
    env::set_var("RETRY_BACKOFF_BASE_MS", "250");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 60000);
    assert_eq!(config.request.max_retries, 5);
    assert_eq!(config.request.backoff_base_ms, 250);

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("MAX_RETRIES");
    env::remove_var("RETRY_BACKOFF_BASE_MS");
}

#[test]
#[serial]
fn test_config_inactivity_timeout() {
    env::set_var("SESSION_INACTIVITY_TIMEOUT_SECS", "1800");
    let config = Config::from_env().unwrap();
    assert_eq!(
        config.tracking.session_inactivity_timeout,
        Some(Duration::from_secs(1800))
    );

    env::set_var("SESSION_INACTIVITY_TIMEOUT_SECS", "0");
    let config = Config::from_env().unwrap();
    assert!(config.tracking.session_inactivity_timeout.is_none());

    env::remove_var("SESSION_INACTIVITY_TIMEOUT_SECS");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    env::set_var("DATABASE_MAX_CONNECTIONS", "not-a-number");
    env::set_var("MAX_RETRIES", "-1");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.max_connections, 5);
    assert_eq!(config.request.max_retries, 3);

    env::remove_var("DATABASE_MAX_CONNECTIONS");
    env::remove_var("MAX_RETRIES");
}
