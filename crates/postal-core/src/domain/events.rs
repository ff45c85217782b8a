//! Shipment events: the append-only record of every delivery lifecycle.
//!
//! The event log is the system of record; the `Shipment` aggregate is a pure
//! fold over the per-parcel event sequence, so current state can always be
//! reconstructed by replay. Events are a closed tagged-variant set: no
//! framework base classes, just data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::channel::Channel;
use super::envelope::Parcel;
use super::ids::EnvelopeId;
use super::topic::{AffectedTopic, Notice, TopicStatusReport};
use super::tracking::{HarnessDetails, ParcelStatus, TrackingCode};

/// One lifecycle transition of a tracked envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ShipmentEvent {
    /// Parcel handed to the courier; carries the parcel so later events can
    /// be interpreted against its envelopes.
    Sent {
        parcel: Parcel,
        metadata: BTreeMap<String, String>,
    },

    /// Envelope assigned to a channel.
    Addressed { channel: Channel },

    /// A harness began executing the envelope's handler.
    Attempting { details: HarnessDetails },

    /// Handler failed with an unhandled error.
    Rejected { message: String },

    /// Handler intentionally aborted delivery.
    Aborted { reason: String },

    /// Handler completed successfully.
    Delivered,

    /// Work affecting a topic began; snapshots the dependency reports
    /// observed at start.
    TopicBeingAffected {
        topic: AffectedTopic,
        notices_at_start: Vec<TopicStatusReport>,
    },

    /// Work affecting a topic completed.
    TopicWasAffected {
        topic: AffectedTopic,
        notices: Vec<Notice>,
    },

    /// A certified notice for the topic became current.
    CertifiedNoticeDelivered {
        topic: AffectedTopic,
        notices: Vec<Notice>,
    },
}

/// An event as appended to the store. The store assigns `seq`; the writer
/// supplies the timestamp from its clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub code: TrackingCode,
    pub at: DateTime<Utc>,
    pub event: ShipmentEvent,
}

/// Per-envelope tracking state inside a shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeTracking {
    pub status: ParcelStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_utc: Option<DateTime<Utc>>,
}

impl EnvelopeTracking {
    /// Fold one event into this envelope's state.
    ///
    /// Sent/Addressed record lifecycle but do not advance the status beyond
    /// Unknown; only an attempt (and its outcome) does.
    pub fn apply(&mut self, at: DateTime<Utc>, event: &ShipmentEvent) {
        match event {
            ShipmentEvent::Sent { .. } | ShipmentEvent::Addressed { .. } => {
                self.last_updated_utc = Some(at);
            }
            ShipmentEvent::Attempting { .. } => {
                self.status = ParcelStatus::Attempting;
                self.last_updated_utc = Some(at);
            }
            ShipmentEvent::Rejected { message } => {
                self.status = ParcelStatus::Rejected;
                self.last_error = Some(message.clone());
                self.last_updated_utc = Some(at);
            }
            ShipmentEvent::Aborted { reason } => {
                self.status = ParcelStatus::Aborted;
                self.last_error = Some(reason.clone());
                self.last_updated_utc = Some(at);
            }
            ShipmentEvent::Delivered => {
                self.status = ParcelStatus::Delivered;
                self.last_error = None;
                self.last_updated_utc = Some(at);
            }
            // Topic events carry no per-envelope status change.
            ShipmentEvent::TopicBeingAffected { .. }
            | ShipmentEvent::TopicWasAffected { .. }
            | ShipmentEvent::CertifiedNoticeDelivered { .. } => {}
        }
    }
}

/// Per-parcel event-sourced aggregate: envelope id -> tracking state.
///
/// Append-only and never deleted; replay is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shipment {
    pub parcel: Option<Parcel>,
    pub envelopes: HashMap<EnvelopeId, EnvelopeTracking>,
}

impl Shipment {
    /// Fold one record into the aggregate.
    pub fn apply(&mut self, record: &EventRecord) {
        if let ShipmentEvent::Sent { parcel, .. } = &record.event {
            self.parcel = Some(parcel.clone());
        }
        self.envelopes
            .entry(record.code.envelope_id)
            .or_default()
            .apply(record.at, &record.event);
    }

    /// Rebuild the aggregate from an ordered event sequence.
    pub fn replay<'a>(records: impl IntoIterator<Item = &'a EventRecord>) -> Self {
        let mut shipment = Self::default();
        for record in records {
            shipment.apply(record);
        }
        shipment
    }

    pub fn envelope(&self, envelope_id: EnvelopeId) -> Option<&EnvelopeTracking> {
        self.envelopes.get(&envelope_id)
    }
}
