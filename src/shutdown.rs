//! Process-wide shutdown coordination.
//! Provides a flag set by signal handlers so a running split can stop before the next file.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way "stop" flag.
//! - `request()` is safe to call from signal handlers.
//! - `CancelToken` scopes cancellation to a single run; it also observes the global flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative shutdown (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Check whether a shutdown has been requested.
#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Per-run cancellation flag, cheap to clone and share with a worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run owning this token to stop before its next file.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once this token was cancelled or a process-wide shutdown was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed) || is_requested()
    }
}
