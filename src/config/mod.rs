//! Configuration module for rc_relay.
//!
//! Two layers live here:
//!
//! - [`Config`]: service-wide settings loaded once from environment variables
//!   (log filter, conversion endpoint, HTTP timeout, BigQuery access).
//! - [`TagConfig`]: the per-invocation tag fields supplied by the host
//!   alongside each event.
//!
//! # Example
//!
//! ```rust,ignore
//! use rc_relay::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Endpoint: {}", config.transport.conversion_endpoint);
//! ```

mod error;
mod logging;
mod parse;
mod tag;
mod transport;

pub use error::ConfigError;
pub use logging::LoggingConfig;
pub use parse::parse_duration;
pub use tag::{
    BigQueryLogType, LogType, TableRef, TagConfig, DEFAULT_CLICK_ID_PARAMETER,
    DEFAULT_COOKIE_EXPIRATION_DAYS,
};
pub use transport::{TransportConfig, DEFAULT_BIGQUERY_API_BASE, DEFAULT_CONVERSION_ENDPOINT};

/// Complete service configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Outbound endpoint configuration.
    pub transport: TransportConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            logging: LoggingConfig::from_env()?,
            transport: TransportConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Service: {}", self.logging.service_name);
        info!("  Log filter: {}", self.logging.filter);
        info!("  Conversion endpoint: {}", self.transport.conversion_endpoint);

        match self.transport.timeout {
            Some(timeout) => info!("  HTTP timeout: {}ms", timeout.as_millis()),
            None => info!("  HTTP timeout: disabled"),
        }

        if self.transport.bigquery_access_token.is_some() {
            info!("  BigQuery: {}", self.transport.bigquery_api_base);
        } else {
            info!("  BigQuery: no access token, inserts are sent unauthenticated");
        }
    }
}
