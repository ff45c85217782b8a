//! In-memory shipment event store: a seq-stamped append-only log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::errors::TrackingError;
use crate::domain::events::{EventRecord, ShipmentEvent};
use crate::domain::ids::ParcelId;
use crate::domain::tracking::TrackingCode;
use crate::ports::event_store::ShipmentEventStore;

#[derive(Default)]
pub struct InMemoryShipmentEventStore {
    records: Mutex<Vec<EventRecord>>,
}

impl InMemoryShipmentEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ShipmentEventStore for InMemoryShipmentEventStore {
    async fn append(
        &self,
        code: TrackingCode,
        at: DateTime<Utc>,
        event: ShipmentEvent,
    ) -> Result<EventRecord, TrackingError> {
        let mut records = self.records.lock().await;
        let record = EventRecord {
            seq: records.len() as u64 + 1,
            code,
            at,
            event,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn events_for_parcel(
        &self,
        parcel_id: ParcelId,
    ) -> Result<Vec<EventRecord>, TrackingError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|record| record.code.parcel_id == parcel_id)
            .cloned()
            .collect())
    }

    async fn all_events(&self) -> Result<Vec<EventRecord>, TrackingError> {
        Ok(self.records.lock().await.clone())
    }
}
