//! In-memory courier: a development/test stand-in for the host job queue.
//!
//! Ready crates live in a FIFO; delayed crates wait in a min-heap keyed by
//! deadline and are promoted when due (so abort-and-reschedule retries
//! actually wait). Recurring schedules are recorded as standing crates and
//! fired on demand; running a cron loop is the host's job, not the core's.

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::domain::errors::CourierError;
use crate::ports::courier::{Courier, CourierHandle, Crate, CrateQueue};

/// Delayed entry for the priority queue.
///
/// Reverse ordering so BinaryHeap acts as a min-heap (earliest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DelayedEntry {
    due: Instant,
    seq: u64,
}

impl PartialOrd for DelayedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct CourierState {
    ready: VecDeque<Crate>,
    delayed: BinaryHeap<DelayedEntry>,
    delayed_crates: HashMap<u64, Crate>,
    recurring: HashMap<CourierHandle, Crate>,
    next_seq: u64,
    closed: bool,
}

impl CourierState {
    /// Move delayed crates whose time has come into the ready queue.
    fn promote_due(&mut self) {
        let now = Instant::now();
        while let Some(entry) = self.delayed.peek() {
            if entry.due > now {
                break; // heap is sorted, nothing else is due
            }
            let entry = *entry;
            self.delayed.pop();
            if let Some(crated) = self.delayed_crates.remove(&entry.seq) {
                self.ready.push_back(crated);
            }
        }
    }
}

pub struct InMemoryCourier {
    state: Arc<Mutex<CourierState>>,
    notify: Arc<Notify>,
}

impl Default for InMemoryCourier {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCourier {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CourierState::default())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Stop accepting crates; waiting consumers drain and then get `None`.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    /// Re-enqueue the standing crate registered under `handle`, as a cron
    /// tick would. Returns false when no such registration exists.
    pub async fn fire_recurring(&self, handle: &CourierHandle) -> bool {
        let mut state = self.state.lock().await;
        let Some(crated) = state.recurring.get(handle).cloned() else {
            return false;
        };
        state.ready.push_back(crated);
        drop(state);
        self.notify.notify_one();
        true
    }

    pub async fn pending(&self) -> usize {
        let state = self.state.lock().await;
        state.ready.len() + state.delayed.len()
    }

    pub async fn recurring_count(&self) -> usize {
        self.state.lock().await.recurring.len()
    }
}

#[async_trait]
impl Courier for InMemoryCourier {
    async fn send(&self, crated: Crate) -> Result<CourierHandle, CourierError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(CourierError::Closed);
        }

        let handle = CourierHandle(crated.tracking_code.to_string());
        if crated.recurring_schedule.is_some() {
            state.recurring.insert(handle.clone(), crated.clone());
        }

        match crated.delay {
            Some(delay) => {
                let seq = state.next_seq;
                state.next_seq += 1;
                state.delayed.push(DelayedEntry {
                    due: Instant::now() + delay,
                    seq,
                });
                state.delayed_crates.insert(seq, crated);
            }
            None => state.ready.push_back(crated),
        }

        drop(state);
        self.notify.notify_one();
        Ok(handle)
    }
}

#[async_trait]
impl CrateQueue for InMemoryCourier {
    async fn next_delivery(&self) -> Option<Crate> {
        loop {
            let next_wake = {
                let mut state = self.state.lock().await;
                state.promote_due();

                if let Some(crated) = state.ready.pop_front() {
                    return Some(crated);
                }
                if state.closed && state.delayed.is_empty() {
                    drop(state);
                    // wake the next waiter so shutdown cascades
                    self.notify.notify_one();
                    return None;
                }
                state.delayed.peek().map(|entry| entry.due)
            };

            // wait for a new crate OR the next delayed deadline
            if let Some(due) = next_wake {
                tokio::select! {
                    _ = self.notify.notified() => {}
                    _ = tokio::time::sleep_until(due.into()) => {}
                }
            } else {
                self.notify.notified().await;
            }
        }
    }
}
