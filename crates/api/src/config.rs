//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATMON_API_BASE_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `DATMON_HTTP_TIMEOUT_SECS` - Outbound HTTP timeout (default: 15)
//! - `DATMON_CATALOG_CACHE_SECS` - Catalog read-cache TTL (default: 300)
//! - `DATMON_PUSH_HEARTBEAT_SECS` - Push heartbeat interval (default: 10)
//! - `DATMON_PUSH_RECONNECT_SECS` - Push reconnect backoff (default: 3)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend REST API.
    pub base_url: Url,
    /// Outbound HTTP timeout. Calls that exceed it fail as network errors.
    pub http_timeout: Duration,
    /// TTL for the catalog read cache.
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("DATMON_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("DATMON_API_BASE_URL".to_string(), e.to_string())
            })?;
        let http_timeout = get_duration_secs("DATMON_HTTP_TIMEOUT_SECS", 15)?;
        let catalog_cache_ttl = get_duration_secs("DATMON_CATALOG_CACHE_SECS", 300)?;

        Ok(Self {
            base_url,
            http_timeout,
            catalog_cache_ttl,
        })
    }

    /// Build a configuration pointing at a known base URL, with defaults
    /// for everything else. Used by tests and the mock backend.
    #[must_use]
    pub fn for_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            http_timeout: Duration::from_secs(15),
            catalog_cache_ttl: Duration::from_secs(300),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a duration (in seconds) with a default value.
fn get_duration_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
