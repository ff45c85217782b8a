//! Courier port: the submission boundary to the host's job queue.
//!
//! The core never talks to a queue directly; it crates a parcel with its
//! delivery metadata and hands it to an injected `Courier`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::channel::Channel;
use crate::domain::envelope::Parcel;
use crate::domain::errors::CourierError;
use crate::domain::schedule::CronSchedule;
use crate::domain::tracking::TrackingCode;

/// A parcel plus delivery/scheduling metadata, ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crate {
    pub tracking_code: TrackingCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Target channel of the lead (non-marker) envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Channel>,

    pub parcel: Parcel,

    /// When present, the courier registers a standing recurring submission
    /// under the returned handle in addition to the immediate one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_schedule: Option<CronSchedule>,

    /// Earliest-delivery delay (abort-and-reschedule retries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

/// Opaque handle to a submitted (or standing) delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourierHandle(pub String);

impl fmt::Display for CourierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External submission boundary.
#[async_trait]
pub trait Courier: Send + Sync {
    async fn send(&self, crated: Crate) -> Result<CourierHandle, CourierError>;
}

/// Delivery side of a courier the in-process worker harness can pull from.
///
/// Durable queue implementations live outside the core; the in-memory
/// courier implements both traits for development and tests.
#[async_trait]
pub trait CrateQueue: Send + Sync {
    /// Next crate ready for delivery. Waits until one is available;
    /// returns `None` once the queue is shut down and drained.
    async fn next_delivery(&self) -> Option<Crate>;
}
