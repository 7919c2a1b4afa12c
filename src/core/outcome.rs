//! Exactly-once completion signalling.
//!
//! An invocation finishes with a single [`Outcome`]. Two paths may try to
//! emit it: the dispatcher's optimistic short-circuit and the deferred
//! transport completion. [`CompletionSignal`] keeps an explicit flag so that
//! only the first emission reaches the host.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// Final result reported to the host for one invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Classify an HTTP status: 200..400 is success.
    #[inline]
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure => f.write_str("failure"),
        }
    }
}

struct SignalInner {
    emitted: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<Outcome>>>,
}

/// Sending half of the completion channel. Cheap to clone.
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<SignalInner>,
}

impl CompletionSignal {
    /// Create a signal together with the receiver the host waits on.
    pub fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let signal = Self {
            inner: Arc::new(SignalInner {
                emitted: AtomicBool::new(false),
                tx: Mutex::new(Some(tx)),
            }),
        };
        (signal, rx)
    }

    /// Emit the outcome. Returns `false` if an outcome was already emitted.
    pub fn emit(&self, outcome: Outcome) -> bool {
        if self.inner.emitted.swap(true, Ordering::AcqRel) {
            tracing::debug!(%outcome, "completion already signalled, ignoring");
            return false;
        }

        let tx = match self.inner.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(tx) = tx {
            // The host may have dropped its receiver; nothing left to notify.
            let _ = tx.send(outcome);
        }
        true
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.emit(Outcome::Success)
    }

    #[inline]
    pub fn failure(&self) -> bool {
        self.emit(Outcome::Failure)
    }

    /// Whether an outcome has already been emitted.
    #[inline]
    pub fn is_emitted(&self) -> bool {
        self.inner.emitted.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("emitted", &self.is_emitted())
            .finish()
    }
}
