//! Tracking-side data model: codes, statuses, reports, harness details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{EnvelopeId, ParcelId};

/// The unit of tracking granularity: one envelope within one parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingCode {
    pub parcel_id: ParcelId,
    pub envelope_id: EnvelopeId,
}

impl TrackingCode {
    pub fn new(parcel_id: ParcelId, envelope_id: EnvelopeId) -> Self {
        Self {
            parcel_id,
            envelope_id,
        }
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parcel_id, self.envelope_id)
    }
}

/// Delivery status of a tracked envelope.
///
/// Transitions: `Unknown -> Attempting -> {Delivered | Rejected | Aborted}`;
/// `Rejected`/`Aborted` may go back to `Attempting` on retry and finally to
/// `Delivered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelStatus {
    #[default]
    Unknown,
    Attempting,
    Rejected,
    Aborted,
    Delivered,
}

/// Details that can be retrieved about a tracked shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelTrackingReport {
    pub code: TrackingCode,

    #[serde(default)]
    pub status: ParcelStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_utc: Option<DateTime<Utc>>,
}

impl ParcelTrackingReport {
    /// Report for a code that was never observed.
    pub fn unknown(code: TrackingCode) -> Self {
        Self {
            code,
            status: ParcelStatus::Unknown,
            last_error: None,
            last_updated_utc: None,
        }
    }
}

/// Metadata about the executing worker process, attached to "attempting"
/// events. Informational only; never affects control flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessDetails {
    pub machine_name: String,
    pub process_name: String,
    pub user: String,
}

impl HarnessDetails {
    /// Best-effort capture from the process environment.
    pub fn capture(process_name: impl Into<String>) -> Self {
        Self {
            machine_name: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".into()),
            process_name: process_name.into(),
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".into()),
        }
    }
}
