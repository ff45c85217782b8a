//! Delivery outcome: what a handler decided about the envelope it handled.
//!
//! Abort/reschedule is an ordinary returned value, not an error: aborting a
//! parcel is expected flow control (topic gating, wait-and-retry), while a
//! handler `Err` is an unhandled failure that gets recorded as Rejected and
//! re-raised to the host scheduler.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the handler decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    /// Message handled; the remainder of the parcel (if any) is forwarded.
    Delivered,

    /// Stop delivering this parcel.
    Aborted(AbortDelivery),
}

/// Details of an intentional delivery abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortDelivery {
    pub reason: String,

    /// When set, the *same, unmodified* parcel is resubmitted for a later
    /// retry; otherwise the parcel is dropped entirely.
    pub reschedule: bool,

    /// Optional delay before the resubmitted parcel becomes deliverable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

impl DeliveryOutcome {
    pub fn delivered() -> Self {
        Self::Delivered
    }

    /// Abort and drop the parcel permanently.
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Aborted(AbortDelivery {
            reason: reason.into(),
            reschedule: false,
            delay: None,
        })
    }

    /// Abort now, retry the same parcel later.
    pub fn abort_and_reschedule(reason: impl Into<String>, delay: Option<Duration>) -> Self {
        Self::Aborted(AbortDelivery {
            reason: reason.into(),
            reschedule: true,
            delay,
        })
    }
}
