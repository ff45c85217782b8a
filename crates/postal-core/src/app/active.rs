//! Active-message accounting for graceful shutdown.
//!
//! Incremented before and decremented after each handler invocation. The
//! host polls it to know when draining is complete. Advisory bookkeeping,
//! not a lock.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ActiveMessageTracker {
    active: AtomicUsize,
}

impl ActiveMessageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.active_count() == 0
    }
}
