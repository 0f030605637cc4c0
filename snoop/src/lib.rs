//! Cancellation and progress tracking for long-running batch loops.
//!
//! Handles are shared by reference across worker threads, so every method takes `&self`.
//! Progress is counted in completed work units (e.g. permutations) rather than fractions.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationError;

impl std::error::Error for CancellationError {}

impl Display for CancellationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("computation was cancelled")
    }
}

pub trait Cancel: Send + Sync {
    /// true if the snoop is cancelled, false if not.
    fn is_cancelled(&self) -> bool;

    /// Returns an Err if the snoop is cancelled. Call at iteration boundaries.
    fn check(&self) -> Result<(), CancellationError> {
        if self.is_cancelled() {
            return Err(CancellationError);
        }
        Ok(())
    }
}

pub trait Progress: Send + Sync {
    /// Announce the number of work units the computation will perform.
    fn set_total(&self, total: u64);

    /// Record `units` more completed work units.
    fn advance(&self, units: u64);
}

pub trait CancelProgress: Cancel + Progress {
    /// Record one completed unit, then check for cancellation.
    fn advance_check(&self) -> Result<(), CancellationError> {
        self.advance(1);
        self.check()
    }
}

impl<T: Cancel + Progress> CancelProgress for T {}

impl<T: Cancel + ?Sized> Cancel for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: Progress + ?Sized> Progress for &T {
    fn set_total(&self, total: u64) {
        (**self).set_total(total)
    }

    fn advance(&self, units: u64) {
        (**self).advance(units)
    }
}

#[derive(Default, Copy, Clone, Debug)]
pub struct NoOpSnoop;

impl Cancel for NoOpSnoop {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Progress for NoOpSnoop {
    fn set_total(&self, _total: u64) {}

    fn advance(&self, _units: u64) {}
}

/// Shared state observed by the caller while a computation runs.
#[derive(Debug, Default)]
pub struct AtomicState {
    cancelled: AtomicBool,
    done: AtomicU64,
    total: AtomicU64,
}

impl AtomicState {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Completed work units so far.
    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    /// Completed fraction in [0, 1]. Zero until a total has been announced.
    pub fn get_progress(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        (self.done() as f64 / total as f64).min(1.0)
    }
}

/// Snoop handle backed by an [`AtomicState`]. Cloning shares the state.
#[derive(Debug, Clone)]
pub struct AtomicSnoop {
    state: Arc<AtomicState>,
}

/// Create a state for the caller and a snoop to pass into the computation.
pub fn atomic() -> (Arc<AtomicState>, AtomicSnoop) {
    let state: Arc<AtomicState> = Default::default();
    (state.clone(), AtomicSnoop { state })
}

impl AtomicSnoop {
    pub fn cancel(&self) {
        self.state.cancel()
    }
}

impl Cancel for AtomicSnoop {
    fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

impl Progress for AtomicSnoop {
    fn set_total(&self, total: u64) {
        self.state.total.store(total, Ordering::Relaxed);
        self.state.done.store(0, Ordering::Relaxed);
    }

    fn advance(&self, units: u64) {
        self.state.done.fetch_add(units, Ordering::Relaxed);
    }
}
