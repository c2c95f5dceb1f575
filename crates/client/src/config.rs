//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PAPERBACK_API_URL` - Base URL of the bookstore service
//!   (default: `http://localhost:8080`)
//! - `PAPERBACK_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `PAPERBACK_USER_AGENT` - User-Agent header value
//!   (default: `paperback-client/<version>`)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote service, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_env_or_default("PAPERBACK_API_URL", DEFAULT_API_URL);
        let api_url = validate_api_url("PAPERBACK_API_URL", &api_url)?;

        let timeout_secs = get_env_or_default(
            "PAPERBACK_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("PAPERBACK_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let user_agent = get_env_or_default(
            "PAPERBACK_USER_AGENT",
            concat!("paperback-client/", env!("CARGO_PKG_VERSION")),
        );

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
        })
    }

    /// Build a configuration for a known base URL, defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse.
    pub fn for_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: validate_api_url("api_url", api_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("paperback-client/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse and normalize the base URL: must be absolute http(s), trailing
/// slash stripped so endpoint paths can be appended verbatim.
fn validate_api_url(name: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }

    Ok(value.trim_end_matches('/').to_string())
}
