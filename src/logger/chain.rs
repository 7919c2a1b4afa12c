//! Sink chain and the per-invocation logger built from it.

use std::sync::Arc;

use super::{LogRecord, LogSettings, LogSink};

/// Ordered list of log sinks, shared across invocations.
#[derive(Clone, Default)]
pub struct SinkChain {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl SinkChain {
    /// Create a new empty chain.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Append a sink. Sinks run in insertion order.
    pub fn add<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Append a sink wrapped in Arc.
    pub fn add_arc(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Sink names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Bind the chain to one invocation's settings.
    pub fn bind(&self, settings: LogSettings) -> Logger {
        Logger {
            chain: self.clone(),
            settings: Arc::new(settings),
        }
    }
}

/// Logger for a single invocation.
#[derive(Clone)]
pub struct Logger {
    chain: SinkChain,
    settings: Arc<LogSettings>,
}

impl Logger {
    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Names of the sinks that would receive a record right now.
    pub fn enabled_sinks(&self) -> Vec<&'static str> {
        self.chain
            .sinks
            .iter()
            .filter(|s| s.enabled(&self.settings))
            .map(|s| s.name())
            .collect()
    }

    /// Fan a record out to every enabled sink.
    ///
    /// Returns the number of sinks that accepted the record.
    pub fn log(&self, record: &LogRecord) -> usize {
        let mut written = 0;

        for sink in &self.chain.sinks {
            if !sink.enabled(&self.settings) {
                continue;
            }

            let result = sink
                .encode(record)
                .and_then(|payload| sink.write(payload, &self.settings));

            match result {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(
                        sink = sink.name(),
                        record_type = ?record.record_type,
                        error = %e,
                        "log sink failed"
                    );
                }
            }
        }

        written
    }
}
