//! Outbound HTTP for conversion requests.
//!
//! The relay sends exactly one request per conversion and only needs the
//! status, headers and body back. [`HttpTransport`] abstracts the client so
//! the pipeline can be driven by [`StubTransport`] in tests and by
//! [`ReqwestTransport`] in production.

mod client;
mod stub;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use serde_json::Value;

pub use client::ReqwestTransport;
pub use stub::{StubRelease, StubTransport};

/// Response to an outbound request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lowercase. Repeated headers are joined with `, `.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match self.headers.get_mut(&name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.headers.insert(name, value.to_string());
            }
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Headers as a JSON object.
    pub fn headers_json(&self) -> Value {
        Value::Object(
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Body as text (invalid UTF-8 is replaced).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Errors raised before a response is available.
#[derive(Debug)]
pub enum TransportError {
    /// The client could not be constructed.
    Build(String),
    /// The request failed (connect, timeout, invalid URL).
    Request(String),
    /// The response body could not be read.
    Body(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Build(msg) => write!(f, "failed to build HTTP client: {}", msg),
            TransportError::Request(msg) => write!(f, "request failed: {}", msg),
            TransportError::Body(msg) => write!(f, "failed to read response body: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Async HTTP client used for conversion requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request without a body.
    async fn send(&self, url: &str, method: Method) -> Result<TransportResponse, TransportError>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
