//! Outbound endpoint configuration.

use std::time::Duration;

use super::parse::{env_duration, env_opt, env_or};
use super::ConfigError;

/// Production conversion endpoint.
pub const DEFAULT_CONVERSION_ENDPOINT: &str = "https://trends.revcontent.com/api/v1/conversion.php";

/// BigQuery REST API root.
pub const DEFAULT_BIGQUERY_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Transport configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Base URL conversion requests are sent to.
    pub conversion_endpoint: String,
    /// Per-request timeout (None = no timeout).
    pub timeout: Option<Duration>,
    /// BigQuery REST API root for the analytical log table.
    pub bigquery_api_base: String,
    /// OAuth bearer token for BigQuery inserts.
    pub bigquery_access_token: Option<String>,
}

impl TransportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let conversion_endpoint = env_or("CONVERSION_ENDPOINT", DEFAULT_CONVERSION_ENDPOINT);
        validate_url("CONVERSION_ENDPOINT", &conversion_endpoint)?;

        let bigquery_api_base = env_or("BIGQUERY_API_BASE", DEFAULT_BIGQUERY_API_BASE);
        validate_url("BIGQUERY_API_BASE", &bigquery_api_base)?;

        Ok(Self {
            conversion_endpoint,
            timeout: env_duration("HTTP_TIMEOUT", "10s")?,
            bigquery_api_base: bigquery_api_base.trim_end_matches('/').to_string(),
            bigquery_access_token: env_opt("BIGQUERY_ACCESS_TOKEN"),
        })
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            conversion_endpoint: DEFAULT_CONVERSION_ENDPOINT.to_string(),
            timeout: Some(Duration::from_secs(10)),
            bigquery_api_base: DEFAULT_BIGQUERY_API_BASE.to_string(),
            bigquery_access_token: None,
        }
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key: key.into(),
            message: format!("'{}' must start with http:// or https://", value),
        })
    }
}
