//! Test helpers and utilities

use std::sync::Arc;

use http::HeaderMap;
use rc_relay::dispatcher::{Invocation, Relay};
use rc_relay::host::{MemoryCookieJar, RuntimeMode};
use rc_relay::logger::{BigQuerySink, ConsoleSink, MemoryConsole, MemoryTable, SinkChain};
use rc_relay::transport::StubTransport;
use serde_json::Value;

/// Relay wired to in-memory sinks, cookie jar and a stub transport.
pub struct TestRelay {
    pub relay: Relay,
    pub transport: StubTransport,
    pub console: Arc<MemoryConsole>,
    pub table: Arc<MemoryTable>,
    pub cookies: MemoryCookieJar,
    pub headers: HeaderMap,
    pub mode: RuntimeMode,
}

#[allow(dead_code)]
impl TestRelay {
    pub fn new(transport: StubTransport) -> Self {
        let console = Arc::new(MemoryConsole::new());
        let table = Arc::new(MemoryTable::new());
        let sinks = SinkChain::new()
            .add(ConsoleSink::new(console.clone()))
            .add(BigQuerySink::new(table.clone()));

        Self {
            relay: Relay::new(Arc::new(transport.clone()), sinks),
            transport,
            console,
            table,
            cookies: MemoryCookieJar::new(),
            headers: HeaderMap::new(),
            mode: RuntimeMode::LIVE,
        }
    }

    /// Relay whose transport answers every request with `status`.
    pub fn with_status(status: u16) -> Self {
        Self::new(StubTransport::status(status))
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(name, value.parse().expect("invalid header value"));
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies = self.cookies.with_cookie(name, value);
        self
    }

    pub fn mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run one event through the relay.
    pub fn handle(&self, config: Value, event: Value) -> Invocation {
        self.relay
            .handle_json(config, event, &self.headers, &self.cookies, self.mode)
            .expect("invalid test payload")
    }

    /// Console lines parsed back into JSON.
    pub fn console_records(&self) -> Vec<Value> {
        self.console
            .lines()
            .iter()
            .map(|l| serde_json::from_str(l).expect("console line is not JSON"))
            .collect()
    }
}

/// Tag configuration for a complete conversion.
#[allow(dead_code)]
pub fn conversion_config(optimistic: bool) -> Value {
    serde_json::json!({
        "type": "conversion",
        "apiKey": "K",
        "clickId": "C",
        "amount": 10,
        "useOptimisticScenario": optimistic,
        "logType": "always"
    })
}
