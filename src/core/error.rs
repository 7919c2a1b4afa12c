//! Core error types.

use std::fmt;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Errors raised while handling one event.
#[derive(Debug)]
pub enum Error {
    /// The configured event type has no handler.
    UnknownEventType(String),

    /// Required conversion parameters are missing or invalid.
    MissingFields(Vec<&'static str>),

    /// The tag configuration or event payload could not be decoded.
    InvalidPayload(serde_json::Error),

    /// Outbound request failed before a response arrived.
    Transport(TransportError),

    /// Service configuration error.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownEventType(kind) => write!(f, "unknown event type: '{}'", kind),
            Error::MissingFields(fields) => write!(
                f,
                "one or more required properties are missing: {}",
                fields.join(" or ")
            ),
            Error::InvalidPayload(e) => write!(f, "invalid payload: {}", e),
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidPayload(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidPayload(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
