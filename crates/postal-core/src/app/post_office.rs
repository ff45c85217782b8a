//! PostOffice: accepts parcels for sending and hands them to the courier.
//!
//! Validates channel names against the transport constraint (fail fast at
//! send time), records Sent/Addressed tracking events, and crates the parcel
//! with its delivery metadata. When a recurring schedule is present, a
//! synthetic recurring-marker envelope is prepended so the dispatcher can
//! tell a scheduled re-trigger from genuine work.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::envelope_machine::EnvelopeMachine;
use crate::domain::envelope::Parcel;
use crate::domain::errors::SendError;
use crate::domain::messages::RecurringHeaderMessage;
use crate::domain::schedule::CronSchedule;
use crate::domain::tracking::TrackingCode;
use crate::ports::courier::{Courier, Crate};
use crate::ports::id_generator::IdGenerator;
use crate::ports::tracking::ParcelTracking;
use crate::typed::message::{AddressedMessage, Message};
use crate::domain::channel::Channel;

/// Delivery metadata for one send.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub label: Option<String>,

    /// Standing recurring submission registered with the courier.
    pub schedule: Option<CronSchedule>,

    /// Earliest-delivery delay (reschedule retries).
    pub delay: Option<Duration>,

    /// Free-form metadata recorded on the Sent event.
    pub metadata: BTreeMap<String, String>,
}

impl SendOptions {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_schedule(mut self, schedule: CronSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }
}

/// Sending seam the dispatcher depends on (re-routing, remainder forwarding,
/// reschedule resubmission).
#[async_trait]
pub trait SendParcels: Send + Sync {
    async fn send(&self, parcel: Parcel, options: SendOptions) -> Result<TrackingCode, SendError>;
}

pub struct PostOffice {
    courier: Arc<dyn Courier>,
    tracking: Arc<dyn ParcelTracking>,
    machine: Arc<EnvelopeMachine>,
    ids: Arc<dyn IdGenerator>,
}

impl PostOffice {
    pub fn new(
        courier: Arc<dyn Courier>,
        tracking: Arc<dyn ParcelTracking>,
        machine: Arc<EnvelopeMachine>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            courier,
            tracking,
            machine,
            ids,
        }
    }

    /// Stuff a single message into a fresh parcel and send it.
    pub async fn send_message<M: Message>(
        &self,
        message: M,
        address: Channel,
    ) -> Result<TrackingCode, SendError> {
        let envelope = self
            .machine
            .stuff(AddressedMessage::new(message, address), None)?;
        let parcel = Parcel::new(self.ids.generate_parcel_id(), vec![envelope]);
        self.send(parcel, SendOptions::default()).await
    }

    /// Stuff an ordered message sequence into one parcel and send it.
    pub async fn send_sequence<M: Message>(
        &self,
        messages: Vec<AddressedMessage<M>>,
        options: SendOptions,
    ) -> Result<TrackingCode, SendError> {
        let mut envelopes = Vec::with_capacity(messages.len());
        for addressed in messages {
            envelopes.push(self.machine.stuff(addressed, None)?);
        }
        let parcel = Parcel::new(self.ids.generate_parcel_id(), envelopes);
        self.send(parcel, options).await
    }
}

#[async_trait]
impl SendParcels for PostOffice {
    async fn send(
        &self,
        mut parcel: Parcel,
        options: SendOptions,
    ) -> Result<TrackingCode, SendError> {
        if parcel.envelopes.is_empty() {
            return Err(SendError::NoEnvelopes);
        }
        for envelope in &parcel.envelopes {
            if let Some(channel) = &envelope.channel {
                channel.validate()?;
            }
        }

        // Tracking is keyed on the lead *real* envelope, resolved before any
        // marker gets prepended.
        let address = parcel.envelopes[0].channel.clone();
        let code = TrackingCode::new(parcel.id, parcel.envelopes[0].id);

        if options.schedule.is_some() {
            let marker = self.machine.stuff(
                AddressedMessage::unaddressed(RecurringHeaderMessage {
                    description: options.label.clone(),
                }),
                None,
            )?;
            parcel.envelopes.insert(0, marker);
        }

        self.tracking
            .update_sent(code, &parcel, options.metadata.clone())
            .await?;
        if let Some(channel) = &address {
            self.tracking.update_addressed(code, channel).await?;
        }

        debug!(%code, address = ?address, recurring = options.schedule.is_some(), "handing crate to courier");
        self.courier
            .send(Crate {
                tracking_code: code,
                label: options.label,
                address,
                parcel,
                recurring_schedule: options.schedule,
                delay: options.delay,
            })
            .await?;

        Ok(code)
    }
}
