//! Structured console sink.

use std::sync::{Arc, Mutex};

use super::{LogRecord, LogSettings, LogSink, SinkError, SinkPayload};
use crate::config::LogType;

/// Destination for console lines. Accepts a single text argument.
pub trait ConsoleWriter: Send + Sync {
    fn write(&self, line: &str);
}

/// Writes console lines through `tracing` at target `console`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingConsole;

impl ConsoleWriter for TracingConsole {
    fn write(&self, line: &str) {
        tracing::info!(target: "console", "{}", line);
    }
}

/// Collects console lines in memory.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<String>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ConsoleWriter for MemoryConsole {
    fn write(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut guard) => guard.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

/// Serializes the canonical record unchanged and writes it as one line.
pub struct ConsoleSink {
    writer: Arc<dyn ConsoleWriter>,
}

impl ConsoleSink {
    pub fn new(writer: Arc<dyn ConsoleWriter>) -> Self {
        Self { writer }
    }

    /// Console sink writing through `tracing`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingConsole))
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    /// `always` logs, `no` never does; `debug` and unset follow the
    /// runtime's debug/preview mode.
    fn enabled(&self, settings: &LogSettings) -> bool {
        match settings.log_type {
            LogType::Always => true,
            LogType::Debug | LogType::Unset => settings.mode.is_debug(),
            LogType::No | LogType::Unrecognized => false,
        }
    }

    fn encode(&self, record: &LogRecord) -> Result<SinkPayload, SinkError> {
        serde_json::to_string(record)
            .map(SinkPayload::Text)
            .map_err(|e| SinkError::Encode(e.to_string()))
    }

    fn write(&self, payload: SinkPayload, _settings: &LogSettings) -> Result<(), SinkError> {
        match payload {
            SinkPayload::Text(line) => {
                self.writer.write(&line);
                Ok(())
            }
            SinkPayload::Row(_) => Err(SinkError::Payload { sink: self.name() }),
        }
    }
}
