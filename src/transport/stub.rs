use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::Method;
use tokio::sync::Notify;

use super::{HttpTransport, TransportError, TransportResponse};

/// Transport returning a canned response without touching the network.
///
/// Every request is recorded. A gated stub holds each response back until
/// its [`StubRelease`] fires, which lets callers observe the pipeline while
/// a request is still in flight.
#[derive(Clone)]
pub struct StubTransport {
    reply: Result<TransportResponse, String>,
    gate: Option<Arc<Notify>>,
    requests: Arc<Mutex<Vec<(Method, String)>>>,
}

/// Releases one held response of a gated [`StubTransport`].
#[derive(Clone)]
pub struct StubRelease {
    gate: Arc<Notify>,
}

impl StubRelease {
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

impl StubTransport {
    /// Always answer with `response`.
    pub fn new(response: TransportResponse) -> Self {
        Self {
            reply: Ok(response),
            gate: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        Self::new(TransportResponse::new(status))
    }

    /// Always fail with a request error.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            gate: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Hold responses until released.
    pub fn gated(mut self) -> (Self, StubRelease) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, StubRelease { gate })
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<(Method, String)> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, url: &str, method: Method) -> Result<TransportResponse, TransportError> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push((method, url.to_string())),
            Err(poisoned) => poisoned.into_inner().push((method, url.to_string())),
        }

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.reply.clone().map_err(TransportError::Request)
    }

    #[inline]
    fn name(&self) -> &'static str {
        "stub"
    }
}
