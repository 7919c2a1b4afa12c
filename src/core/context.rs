//! Per-invocation context threaded through every handler.

use std::time::Instant;

use http::HeaderMap;

use crate::host::header_str;

/// Inbound header carrying the correlation id.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Inbound header used when the event carries no page location.
pub const REFERER_HEADER: &str = "referer";

/// Invocation-scoped values captured once by the dispatcher.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    /// Correlation id copied into every log record.
    pub trace_id: Option<String>,

    /// Whether the dispatcher reports success without waiting for the
    /// outbound request.
    pub optimistic: bool,

    /// Effective page URL: event `page_location`, else the `referer` header.
    pub url: Option<String>,

    /// Invocation start time.
    pub started_at: Instant,
}

impl InvocationContext {
    /// Create a context with explicit values.
    pub fn new(trace_id: Option<String>, optimistic: bool, url: Option<String>) -> Self {
        Self {
            trace_id,
            optimistic,
            url,
            started_at: Instant::now(),
        }
    }

    /// Capture trace id and effective URL from the inbound request.
    pub fn capture(headers: &HeaderMap, page_location: Option<&str>, optimistic: bool) -> Self {
        let trace_id = header_str(headers, TRACE_ID_HEADER).map(str::to_string);
        let url = page_location
            .or_else(|| header_str(headers, REFERER_HEADER))
            .map(str::to_string);

        Self::new(trace_id, optimistic, url)
    }

    #[inline]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    #[inline]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Elapsed time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64() * 1000.0
    }
}
