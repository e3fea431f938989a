//! Progress and cancellation hooks.
//!
//! The surrounding system runs checks on worker threads and polls a status
//! record elsewhere. The core never holds that shared state itself; callers
//! pass a progress callback and a cooperative cancellation predicate, both
//! invoked at well-defined points (batch start, per feature, batch end).

use crate::error::{Error, Result};

/// Progress callback: `(current, total)`
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Sync);

/// Cancellation predicate: return `true` to stop between iterations
pub type CancelFn<'a> = &'a (dyn Fn() -> bool + Sync);

/// Caller-supplied hooks for long-running batches.
#[derive(Default, Clone, Copy)]
pub struct Hooks<'a> {
    on_progress: Option<ProgressFn<'a>>,
    cancelled: Option<CancelFn<'a>>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, f: ProgressFn<'a>) -> Self {
        self.on_progress = Some(f);
        self
    }

    pub fn with_cancel(mut self, f: CancelFn<'a>) -> Self {
        self.cancelled = Some(f);
        self
    }

    /// Report progress, if a callback was supplied.
    pub fn progress(&self, current: usize, total: usize) {
        if let Some(f) = self.on_progress {
            f(current, total);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.map(|f| f()).unwrap_or(false)
    }

    /// Error out of a batch when the caller requested cancellation.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
