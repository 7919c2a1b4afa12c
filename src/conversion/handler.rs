//! Conversion handler: validate, log, send, classify.

use std::sync::Arc;

use http::Method;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use super::RequestParameters;
use crate::config::{TagConfig, DEFAULT_CONVERSION_ENDPOINT};
use crate::core::{CompletionSignal, Error, EventEnvelope, InvocationContext, Outcome, Result};
use crate::host::CookieStore;
use crate::logger::{LogRecord, Logger};
use crate::transport::HttpTransport;

/// Diagnostic message logged when validation fails.
pub const NOT_SENT_MESSAGE: &str = "Request was not sent.";

/// Sends conversion requests through an [`HttpTransport`].
#[derive(Clone)]
pub struct ConversionHandler {
    transport: Arc<dyn HttpTransport>,
    endpoint: Arc<str>,
}

impl ConversionHandler {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_endpoint(transport, DEFAULT_CONVERSION_ENDPOINT)
    }

    /// Send requests to a non-default base URL.
    pub fn with_endpoint(transport: Arc<dyn HttpTransport>, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: Arc::from(endpoint),
        }
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Handle one conversion event.
    ///
    /// On missing fields a `Message` record is logged, failure is signalled
    /// and [`Error::MissingFields`] is returned. Otherwise a `Request` record
    /// is logged and the request is spawned on the current Tokio runtime;
    /// the returned handle completes after the `Response` record is logged.
    /// Outside optimistic mode the response status decides the outcome.
    pub fn handle(
        &self,
        config: &TagConfig,
        event: &EventEnvelope,
        ctx: &InvocationContext,
        cookies: &dyn CookieStore,
        logger: &Logger,
        signal: &CompletionSignal,
    ) -> Result<JoinHandle<()>> {
        let params = RequestParameters::collect(config, event, cookies);

        if let Some(missing) = params.missing_required_fields() {
            let reason = format!(
                "One or more required properties are missing: {}",
                missing.join(" or ")
            );
            logger.log(&LogRecord::message(ctx.trace_id(), NOT_SENT_MESSAGE, reason));
            signal.failure();
            return Err(Error::MissingFields(missing));
        }

        let url = params.request_url(&self.endpoint);
        logger.log(&LogRecord::request(ctx.trace_id(), Method::GET.as_str(), &url));

        let transport = Arc::clone(&self.transport);
        let logger = logger.clone();
        let signal = signal.clone();
        let trace_id = ctx.trace_id.clone();
        let optimistic = ctx.optimistic;

        Ok(tokio::spawn(async move {
            let (status, record) = match transport.send(&url, Method::GET).await {
                Ok(resp) => {
                    let record = LogRecord::response(
                        trace_id.as_deref(),
                        resp.status,
                        resp.headers_json(),
                        Value::String(resp.body_text()),
                    );
                    (resp.status, record)
                }
                Err(e) => {
                    tracing::warn!(
                        trace_id = ?trace_id,
                        transport = transport.name(),
                        error = %e,
                        "conversion request failed"
                    );
                    let record = LogRecord::response(
                        trace_id.as_deref(),
                        0,
                        Value::Object(Map::new()),
                        Value::String(e.to_string()),
                    );
                    (0, record)
                }
            };

            logger.log(&record);
            tracing::debug!(trace_id = ?trace_id, status, "conversion response");

            if !optimistic {
                signal.emit(Outcome::from_status(status));
            }
        }))
    }
}
