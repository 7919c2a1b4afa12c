//! Invocation entry point.
//!
//! [`Relay::handle`] runs one event through the pipeline:
//!
//! ```text
//! capture context ─▶ consent gate ─▶ preview filter ─▶ route by type
//!                        │ denied          │ preview        ├─ page_view  ─▶ cookie
//!                        ▼                 ▼                └─ conversion ─▶ request (spawned)
//!                     success           success
//! ```
//!
//! The result is an [`Invocation`]: a single-use outcome channel plus the
//! handle of the spawned request, if any. The outcome is emitted exactly
//! once. In optimistic mode the dispatcher emits success right after routing
//! and the request only contributes its `Response` log record.

use std::sync::Arc;

use http::HeaderMap;
use serde_json::Value;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::config::{Config, TagConfig};
use crate::consent::is_consent_given_or_not_required;
use crate::conversion::ConversionHandler;
use crate::cookie::handle_page_view;
use crate::core::{CompletionSignal, EventEnvelope, EventKind, InvocationContext, Outcome, Result};
use crate::host::{CookieStore, RuntimeMode};
use crate::logger::{BigQueryRestTable, BigQuerySink, ConsoleSink, LogSettings, SinkChain};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Traffic from the tag manager's own preview tool is never forwarded.
pub const PREVIEW_URL_PREFIX: &str = "https://gtm-msr.appspot.com/";

/// Whether the URL belongs to preview-tool traffic.
#[inline]
pub fn is_preview_url(url: &str) -> bool {
    url.starts_with(PREVIEW_URL_PREFIX)
}

/// Event relay shared across invocations.
#[derive(Clone)]
pub struct Relay {
    conversion: ConversionHandler,
    sinks: SinkChain,
}

impl Relay {
    pub fn new(transport: Arc<dyn HttpTransport>, sinks: SinkChain) -> Self {
        Self {
            conversion: ConversionHandler::new(transport),
            sinks,
        }
    }

    /// Override the conversion base URL.
    pub fn with_endpoint(self, endpoint: &str) -> Self {
        let transport = self.conversion.transport();
        Self {
            conversion: ConversionHandler::with_endpoint(transport, endpoint),
            sinks: self.sinks,
        }
    }

    /// Production relay: `reqwest` transport, console sink through
    /// `tracing`, BigQuery sink over REST.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.transport)?;
        let table = BigQueryRestTable::new(&config.transport)?;

        let sinks = SinkChain::new()
            .add(ConsoleSink::tracing())
            .add(BigQuerySink::new(Arc::new(table)));

        Ok(Self::new(Arc::new(transport), sinks)
            .with_endpoint(&config.transport.conversion_endpoint))
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        self.conversion.endpoint()
    }

    #[inline]
    pub fn sinks(&self) -> &SinkChain {
        &self.sinks
    }

    /// Decode the host's JSON objects and handle the event.
    pub fn handle_json(
        &self,
        config: Value,
        event: Value,
        headers: &HeaderMap,
        cookies: &dyn CookieStore,
        mode: RuntimeMode,
    ) -> Result<Invocation> {
        let config = TagConfig::from_value(config)?;
        let event = EventEnvelope::from_value(event)?;
        Ok(self.handle(&config, &event, headers, cookies, mode))
    }

    /// Handle one event.
    ///
    /// Must be called from within a Tokio runtime: conversion requests are
    /// spawned onto it.
    pub fn handle(
        &self,
        config: &TagConfig,
        event: &EventEnvelope,
        headers: &HeaderMap,
        cookies: &dyn CookieStore,
        mode: RuntimeMode,
    ) -> Invocation {
        let ctx = InvocationContext::capture(headers, event.page_location(), config.optimistic());
        let (signal, rx) = CompletionSignal::channel();

        let span = tracing::debug_span!(
            "invocation",
            trace_id = ctx.trace_id().unwrap_or_default(),
            event_type = config.event_type.as_deref().unwrap_or_default(),
        );
        let _guard = span.enter();

        if !is_consent_given_or_not_required(config, event) {
            tracing::debug!("ad storage consent denied, skipping");
            signal.success();
            return Invocation::new(rx, None);
        }

        if ctx.url().is_some_and(is_preview_url) {
            tracing::debug!("preview traffic, skipping");
            signal.success();
            return Invocation::new(rx, None);
        }

        let kind = match config.event_kind() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::debug!(error = %e, "no handler for event");
                signal.failure();
                return Invocation::new(rx, None);
            }
        };

        let logger = self.sinks.bind(LogSettings::from_tag(config, mode));

        let task = match kind {
            EventKind::PageView => {
                handle_page_view(config, &ctx, cookies, &signal);
                None
            }
            EventKind::Conversion => {
                match self
                    .conversion
                    .handle(config, event, &ctx, cookies, &logger, &signal)
                {
                    Ok(task) => Some(task),
                    Err(e) => {
                        tracing::debug!(error = %e, "conversion not sent");
                        None
                    }
                }
            }
        };

        if ctx.optimistic {
            signal.success();
        }

        tracing::debug!(elapsed_ms = ctx.elapsed_ms(), "invocation dispatched");
        Invocation::new(rx, task)
    }
}

/// Completion handle for one invocation.
#[derive(Debug)]
pub struct Invocation {
    rx: Option<oneshot::Receiver<Outcome>>,
    outcome: Option<Outcome>,
    task: Option<JoinHandle<()>>,
}

impl Invocation {
    fn new(rx: oneshot::Receiver<Outcome>, task: Option<JoinHandle<()>>) -> Self {
        Self {
            rx: Some(rx),
            outcome: None,
            task,
        }
    }

    /// Wait for the outcome.
    ///
    /// Returns `None` if the invocation ended without emitting one.
    pub async fn outcome(&mut self) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }

        let rx = self.rx.take()?;
        self.outcome = rx.await.ok();
        self.outcome
    }

    /// The outcome if it has been emitted, without waiting.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }

        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                self.rx = None;
            }
            Err(TryRecvError::Closed) => self.rx = None,
            Err(TryRecvError::Empty) => {}
        }
        self.outcome
    }

    /// Whether a conversion request is still in flight.
    pub fn is_request_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait for the outbound request (and its response logging) to finish,
    /// then return the outcome.
    pub async fn finish(mut self) -> Option<Outcome> {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "conversion task failed");
            }
        }
        self.outcome().await
    }
}
