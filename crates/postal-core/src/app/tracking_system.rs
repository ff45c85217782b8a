//! ParcelTrackingSystem: event-sourced write side plus an asynchronous
//! read-model projector.
//!
//! Every update appends exactly one record to the injected event store and
//! feeds it to a projector task. The projector folds records (per tracking
//! code, in append order) into the read model: status by code, latest topic
//! status report, latest certified notice. The read model is eventually
//! consistent with the log and can be rebuilt from it at any time.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::envelope_machine::EnvelopeMachine;
use crate::domain::channel::Channel;
use crate::domain::envelope::{Envelope, Parcel};
use crate::domain::errors::TrackingError;
use crate::domain::events::{EnvelopeTracking, EventRecord, Shipment, ShipmentEvent};
use crate::domain::ids::ParcelId;
use crate::domain::messages::{TopicBeingAffectedMessage, TopicWasAffectedMessage};
use crate::domain::topic::{
    AffectedTopic, CertifiedNotice, TopicStatus, TopicStatusReport,
};
use crate::domain::tracking::{
    HarnessDetails, ParcelTrackingReport, TrackingCode,
};
use crate::domain::type_descriptor::TypeComparer;
use crate::ports::clock::Clock;
use crate::ports::event_store::ShipmentEventStore;
use crate::ports::tracking::{ParcelTracking, TrackingReports};
use crate::typed::message::Message;

/// Projected read model. Derived state only; the event log is the record.
#[derive(Debug, Default)]
struct ReadModel {
    envelopes: HashMap<TrackingCode, EnvelopeTracking>,
    topics: HashMap<String, TopicStatusReport>,
    notices: HashMap<String, CertifiedNotice>,

    /// Parcels whose topic began being affected and has not completed;
    /// a rejection against them fails the topic.
    topics_in_flight: HashMap<ParcelId, String>,
}

fn project(model: &mut ReadModel, record: &EventRecord) {
    model
        .envelopes
        .entry(record.code)
        .or_default()
        .apply(record.at, &record.event);

    match &record.event {
        ShipmentEvent::TopicBeingAffected {
            topic,
            notices_at_start,
        } => {
            model.topics.insert(
                topic.name().to_string(),
                TopicStatusReport {
                    topic: topic.clone(),
                    status: TopicStatus::BeingAffected,
                    affects_completed_time_utc: None,
                    dependency_topic_notices_at_start: notices_at_start.clone(),
                },
            );
            model
                .topics_in_flight
                .insert(record.code.parcel_id, topic.name().to_string());
        }
        ShipmentEvent::TopicWasAffected { topic, .. } => {
            let report = model
                .topics
                .entry(topic.name().to_string())
                .or_insert_with(|| TopicStatusReport::unknown(topic.clone()));
            report.status = TopicStatus::WasAffected;
            report.affects_completed_time_utc = Some(record.at);
            model.topics_in_flight.remove(&record.code.parcel_id);
        }
        ShipmentEvent::CertifiedNoticeDelivered { topic, notices } => {
            // last write wins by delivery time
            let key = topic.name().to_string();
            let newer = model
                .notices
                .get(&key)
                .is_none_or(|existing| existing.delivered_time_utc <= record.at);
            if newer {
                model.notices.insert(
                    key.clone(),
                    CertifiedNotice {
                        group_key: key,
                        delivered_time_utc: record.at,
                        notices: notices.clone(),
                    },
                );
            }
        }
        ShipmentEvent::Rejected { .. } => {
            if let Some(name) = model.topics_in_flight.get(&record.code.parcel_id) {
                if let Some(report) = model.topics.get_mut(name) {
                    report.status = TopicStatus::Failed;
                }
            }
        }
        _ => {}
    }
}

pub struct ParcelTrackingSystem<E: ShipmentEventStore> {
    store: Arc<E>,
    clock: Arc<dyn Clock>,
    machine: Arc<EnvelopeMachine>,
    read: Arc<RwLock<ReadModel>>,
    tx: mpsc::UnboundedSender<EventRecord>,
    applied_rx: watch::Receiver<u64>,
    appended: AtomicU64,
    projector: JoinHandle<()>,
}

impl<E: ShipmentEventStore> ParcelTrackingSystem<E> {
    /// Spawns the projector task; requires a running tokio runtime.
    pub fn new(store: Arc<E>, clock: Arc<dyn Clock>, machine: Arc<EnvelopeMachine>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<EventRecord>();
        let (applied_tx, applied_rx) = watch::channel(0u64);
        let read = Arc::new(RwLock::new(ReadModel::default()));

        let read_for_projector = Arc::clone(&read);
        let projector = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let mut model = read_for_projector.write().await;
                project(&mut model, &record);
                let _ = applied_tx.send(record.seq);
            }
        });

        Self {
            store,
            clock,
            machine,
            read,
            tx,
            applied_rx,
            appended: AtomicU64::new(0),
            projector,
        }
    }

    async fn append(&self, code: TrackingCode, event: ShipmentEvent) -> Result<(), TrackingError> {
        let record = self.store.append(code, self.clock.now(), event).await?;
        self.appended.fetch_max(record.seq, Ordering::SeqCst);
        // a closed projector freezes the read model; the log stays intact
        let _ = self.tx.send(record);
        Ok(())
    }

    /// Wait until everything appended so far has been projected.
    pub async fn settle(&self) {
        let target = self.appended.load(Ordering::SeqCst);
        let mut rx = self.applied_rx.clone();
        while *rx.borrow() < target {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Rebuild the read model by replaying the full log. Startup recovery;
    /// concurrent appends will be re-applied by the projector afterwards.
    pub async fn rebuild(&self) -> Result<(), TrackingError> {
        let records = self.store.all_events().await?;
        let mut model = ReadModel::default();
        for record in &records {
            project(&mut model, record);
        }
        *self.read.write().await = model;
        debug!(records = records.len(), "read model rebuilt from event log");
        Ok(())
    }

    /// The delivered envelope, recovered from the shipment's Sent parcel.
    async fn delivered_envelope(
        &self,
        code: TrackingCode,
    ) -> Result<Option<Envelope>, TrackingError> {
        let records = self.store.events_for_parcel(code.parcel_id).await?;
        let shipment = Shipment::replay(&records);
        Ok(shipment.parcel.and_then(|parcel| {
            parcel
                .envelopes
                .into_iter()
                .find(|envelope| envelope.id == code.envelope_id)
        }))
    }

    /// Topic lifecycle events derived from a delivered topic message.
    async fn certify_if_topic_message(&self, code: TrackingCode) -> Result<(), TrackingError> {
        let Some(envelope) = self.delivered_envelope(code).await? else {
            return Ok(());
        };

        let comparer = TypeComparer::new(self.machine.strategy());
        if comparer.matches(
            &envelope.message_type,
            &TopicBeingAffectedMessage::descriptor(),
        ) {
            let message: TopicBeingAffectedMessage = self.machine.open(&envelope)?;
            self.append(
                code,
                ShipmentEvent::TopicBeingAffected {
                    topic: message.topic,
                    notices_at_start: message.dependency_notices_at_start,
                },
            )
            .await?;
        } else if comparer.matches(
            &envelope.message_type,
            &TopicWasAffectedMessage::descriptor(),
        ) {
            let message: TopicWasAffectedMessage = self.machine.open(&envelope)?;
            self.append(
                code,
                ShipmentEvent::TopicWasAffected {
                    topic: message.topic.clone(),
                    notices: message.notices.clone(),
                },
            )
            .await?;
            self.append(
                code,
                ShipmentEvent::CertifiedNoticeDelivered {
                    topic: message.topic,
                    notices: message.notices,
                },
            )
            .await?;
        }
        Ok(())
    }
}

impl<E: ShipmentEventStore> Drop for ParcelTrackingSystem<E> {
    fn drop(&mut self) {
        self.projector.abort();
    }
}

#[async_trait]
impl<E: ShipmentEventStore> ParcelTracking for ParcelTrackingSystem<E> {
    async fn update_sent(
        &self,
        code: TrackingCode,
        parcel: &Parcel,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), TrackingError> {
        self.append(
            code,
            ShipmentEvent::Sent {
                parcel: parcel.clone(),
                metadata,
            },
        )
        .await
    }

    async fn update_addressed(
        &self,
        code: TrackingCode,
        channel: &Channel,
    ) -> Result<(), TrackingError> {
        self.append(
            code,
            ShipmentEvent::Addressed {
                channel: channel.clone(),
            },
        )
        .await
    }

    async fn update_attempting(
        &self,
        code: TrackingCode,
        details: &HarnessDetails,
    ) -> Result<(), TrackingError> {
        self.append(
            code,
            ShipmentEvent::Attempting {
                details: details.clone(),
            },
        )
        .await
    }

    async fn update_rejected(
        &self,
        code: TrackingCode,
        message: &str,
    ) -> Result<(), TrackingError> {
        self.append(
            code,
            ShipmentEvent::Rejected {
                message: message.to_string(),
            },
        )
        .await
    }

    async fn update_aborted(&self, code: TrackingCode, reason: &str) -> Result<(), TrackingError> {
        self.append(
            code,
            ShipmentEvent::Aborted {
                reason: reason.to_string(),
            },
        )
        .await
    }

    async fn update_delivered(&self, code: TrackingCode) -> Result<(), TrackingError> {
        self.append(code, ShipmentEvent::Delivered).await?;
        self.certify_if_topic_message(code).await
    }
}

#[async_trait]
impl<E: ShipmentEventStore> TrackingReports for ParcelTrackingSystem<E> {
    async fn tracking_report(
        &self,
        codes: &[TrackingCode],
    ) -> Result<Vec<ParcelTrackingReport>, TrackingError> {
        let model = self.read.read().await;
        Ok(codes
            .iter()
            .map(|code| match model.envelopes.get(code) {
                Some(tracking) => ParcelTrackingReport {
                    code: *code,
                    status: tracking.status,
                    last_error: tracking.last_error.clone(),
                    last_updated_utc: tracking.last_updated_utc,
                },
                None => ParcelTrackingReport::unknown(*code),
            })
            .collect())
    }

    async fn latest_topic_status(
        &self,
        topic: &AffectedTopic,
        filter: Option<TopicStatus>,
    ) -> Result<Option<TopicStatusReport>, TrackingError> {
        let model = self.read.read().await;
        Ok(model
            .topics
            .get(topic.name())
            .filter(|report| filter.is_none_or(|status| report.status == status))
            .cloned())
    }

    async fn latest_certified_notice(
        &self,
        group_key: &str,
    ) -> Result<Option<CertifiedNotice>, TrackingError> {
        let model = self.read.read().await;
        Ok(model.notices.get(group_key).cloned())
    }
}
