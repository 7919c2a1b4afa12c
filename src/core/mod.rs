//! Core types shared by the dispatcher and handlers.
//!
//! - [`EventEnvelope`] - host event snapshot
//! - [`EventKind`] - routable event types
//! - [`InvocationContext`] - trace id, optimistic flag and effective URL
//! - [`Outcome`] / [`CompletionSignal`] - exactly-once completion
//! - [`Error`] - core error types

mod context;
mod error;
mod event;
mod outcome;

pub use context::{InvocationContext, REFERER_HEADER, TRACE_ID_HEADER};
pub use error::{Error, Result};
pub use event::{EventEnvelope, EventKind};
pub use outcome::{CompletionSignal, Outcome};
