//! ShipmentEventStore port: the injected append-only event log repository.
//!
//! The log is the system of record; the read model is derived and can be
//! rebuilt from it at any time. Ordering is per tracking code: the store
//! must return a code's events in append order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::TrackingError;
use crate::domain::events::{EventRecord, ShipmentEvent};
use crate::domain::ids::ParcelId;
use crate::domain::tracking::TrackingCode;

#[async_trait]
pub trait ShipmentEventStore: Send + Sync {
    /// Append one event; the store assigns the sequence number.
    async fn append(
        &self,
        code: TrackingCode,
        at: DateTime<Utc>,
        event: ShipmentEvent,
    ) -> Result<EventRecord, TrackingError>;

    /// All events for a parcel, in append order.
    async fn events_for_parcel(&self, parcel_id: ParcelId)
    -> Result<Vec<EventRecord>, TrackingError>;

    /// The full log in append order (read-model rebuilds).
    async fn all_events(&self) -> Result<Vec<EventRecord>, TrackingError>;
}
