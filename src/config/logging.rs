//! Logging configuration.

use super::parse::env_or;
use super::ConfigError;

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: rc_relay=debug,reqwest=warn
    pub fn from_env() -> Result<Self, ConfigError> {
        let filter = Self::resolve_log_filter()?;
        Ok(Self {
            filter,
            service_name: env_or("SERVICE_NAME", "rc_relay"),
        })
    }

    /// Resolve log filter from environment.
    fn resolve_log_filter() -> Result<String, ConfigError> {
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            let level = level.to_lowercase();
            return match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {
                    Ok(format!("rc_relay={}", level))
                }
                _ => Err(ConfigError::Invalid {
                    key: "LOG_LEVEL".into(),
                    message: format!(
                        "'{}', expected: trace, debug, info, warn, error",
                        level
                    ),
                }),
            };
        }

        if let Ok(filter) = std::env::var("RUST_LOG") {
            return Ok(filter);
        }

        Ok("rc_relay=info".to_string())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rc_relay=info".to_string(),
            service_name: "rc_relay".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_log_level_priority() {
        env::remove_var("LOG_LEVEL");
        env::remove_var("RUST_LOG");

        assert_eq!(LoggingConfig::resolve_log_filter().unwrap(), "rc_relay=info");

        env::set_var("RUST_LOG", "rc_relay=warn,reqwest=debug");
        assert_eq!(
            LoggingConfig::resolve_log_filter().unwrap(),
            "rc_relay=warn,reqwest=debug"
        );

        // LOG_LEVEL takes priority over RUST_LOG
        env::set_var("LOG_LEVEL", "DEBUG");
        assert_eq!(LoggingConfig::resolve_log_filter().unwrap(), "rc_relay=debug");

        env::set_var("LOG_LEVEL", "verbose");
        assert!(matches!(
            LoggingConfig::resolve_log_filter(),
            Err(ConfigError::Invalid { .. })
        ));

        env::remove_var("LOG_LEVEL");
        env::remove_var("RUST_LOG");
    }
}
