//! Diagnostic log fan-out.
//!
//! Handlers describe what happened with one canonical [`LogRecord`]. The
//! [`Logger`] hands that record to every [`LogSink`] whose `enabled` check
//! passes for the current invocation; each sink encodes the record its own
//! way and writes it.
//!
//! ```text
//! LogRecord ─┬─ ConsoleSink.enabled? ── encode: JSON text ──── ConsoleWriter
//!            └─ BigQuerySink.enabled? ─ encode: snake_case row ─ AnalyticalTable
//! ```
//!
//! Logging is best-effort: sink failures are reported through `tracing`
//! and never reach the caller.

mod bigquery;
mod chain;
mod console;

pub use bigquery::{
    AnalyticalTable, BigQueryRestTable, BigQuerySink, InsertOptions, MemoryTable, TableInsert,
    BIGQUERY_KEY_MAPPING,
};
pub use chain::{Logger, SinkChain};
pub use console::{ConsoleSink, ConsoleWriter, MemoryConsole, TracingConsole};

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{BigQueryLogType, LogType, TableRef, TagConfig};
use crate::host::RuntimeMode;

/// Tag name stamped on every record.
pub const TAG_NAME: &str = "RevContent";

/// Event name stamped on conversion records.
pub const CONVERSION_EVENT_NAME: &str = "Conversion";

/// Kind of diagnostic record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RecordType {
    Message,
    Request,
    Response,
}

/// Canonical log record. Field names are the wire names sinks start from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogRecord {
    #[serde(rename = "Name")]
    pub name: &'static str,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    #[serde(rename = "TraceId", skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(rename = "EventName")]
    pub event_name: &'static str,
    #[serde(rename = "Message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "RequestMethod", skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    #[serde(rename = "RequestUrl", skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(rename = "RequestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(rename = "ResponseStatusCode", skip_serializing_if = "Option::is_none")]
    pub response_status_code: Option<u16>,
    #[serde(rename = "ResponseHeaders", skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Value>,
    #[serde(rename = "ResponseBody", skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
}

impl LogRecord {
    fn base(record_type: RecordType, trace_id: Option<&str>) -> Self {
        Self {
            name: TAG_NAME,
            record_type,
            trace_id: trace_id.map(str::to_string),
            event_name: CONVERSION_EVENT_NAME,
            message: None,
            reason: None,
            request_method: None,
            request_url: None,
            request_body: None,
            response_status_code: None,
            response_headers: None,
            response_body: None,
        }
    }

    /// Free-form diagnostic.
    pub fn message(trace_id: Option<&str>, message: &str, reason: impl Into<String>) -> Self {
        Self {
            message: Some(message.to_string()),
            reason: Some(reason.into()),
            ..Self::base(RecordType::Message, trace_id)
        }
    }

    /// Outbound request about to be sent.
    pub fn request(trace_id: Option<&str>, method: &str, url: &str) -> Self {
        Self {
            request_method: Some(method.to_string()),
            request_url: Some(url.to_string()),
            ..Self::base(RecordType::Request, trace_id)
        }
    }

    /// Response (or transport failure) for the outbound request.
    pub fn response(trace_id: Option<&str>, status: u16, headers: Value, body: Value) -> Self {
        Self {
            response_status_code: Some(status),
            response_headers: Some(headers),
            response_body: Some(body),
            ..Self::base(RecordType::Response, trace_id)
        }
    }

    /// The record as a JSON object with its canonical field names.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Sink-specific encoding of a record.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkPayload {
    /// A single line of text.
    Text(String),
    /// A table row.
    Row(Map<String, Value>),
}

/// Error raised by a sink. Logged, never propagated.
#[derive(Debug)]
pub enum SinkError {
    /// The record could not be encoded.
    Encode(String),
    /// The sink received a payload it cannot write.
    Payload { sink: &'static str },
    /// The sink is misconfigured (e.g. incomplete table address).
    Config(String),
    /// The destination rejected the write.
    Write(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Encode(msg) => write!(f, "encode failed: {}", msg),
            SinkError::Payload { sink } => write!(f, "unexpected payload for sink '{}'", sink),
            SinkError::Config(msg) => write!(f, "sink misconfigured: {}", msg),
            SinkError::Write(msg) => write!(f, "write failed: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// Per-invocation inputs that decide which sinks run and where they write.
#[derive(Clone, Debug, PartialEq)]
pub struct LogSettings {
    pub log_type: LogType,
    pub big_query_log_type: BigQueryLogType,
    pub table: TableRef,
    pub mode: RuntimeMode,
}

impl LogSettings {
    pub fn from_tag(config: &TagConfig, mode: RuntimeMode) -> Self {
        Self {
            log_type: config.log_type(),
            big_query_log_type: config.big_query_log_type(),
            table: config.log_table(),
            mode,
        }
    }

    /// Settings with every sink disabled.
    pub fn disabled() -> Self {
        Self {
            log_type: LogType::No,
            big_query_log_type: BigQueryLogType::No,
            table: TableRef::default(),
            mode: RuntimeMode::LIVE,
        }
    }
}

/// One log destination.
pub trait LogSink: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this sink receives records for the invocation.
    fn enabled(&self, settings: &LogSettings) -> bool;

    /// Encode the canonical record for this destination.
    fn encode(&self, record: &LogRecord) -> Result<SinkPayload, SinkError>;

    /// Write an encoded payload.
    fn write(&self, payload: SinkPayload, settings: &LogSettings) -> Result<(), SinkError>;
}
