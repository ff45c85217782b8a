//! Shared fakes for app-layer tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::envelope_machine::EnvelopeMachine;
use super::post_office::{SendOptions, SendParcels};
use crate::domain::channel::Channel;
use crate::domain::envelope::Parcel;
use crate::domain::errors::{CourierError, SendError, TrackingError};
use crate::domain::tracking::{HarnessDetails, TrackingCode};
use crate::domain::type_descriptor::TypeMatchStrategy;
use crate::ports::clock::SystemClock;
use crate::ports::courier::{Courier, CourierHandle, Crate};
use crate::ports::id_generator::UlidGenerator;
use crate::ports::tracking::ParcelTracking;

pub fn machine() -> Arc<EnvelopeMachine> {
    Arc::new(EnvelopeMachine::new(
        TypeMatchStrategy::NamespaceAndName,
        Arc::new(UlidGenerator::new(SystemClock)),
    ))
}

/// Courier that records every crate and delivers nothing.
#[derive(Default)]
pub struct RecordingCourier {
    crates: Mutex<Vec<Crate>>,
}

impl RecordingCourier {
    pub fn crates(&self) -> Vec<Crate> {
        self.crates.lock().unwrap().clone()
    }
}

#[async_trait]
impl Courier for RecordingCourier {
    async fn send(&self, crated: Crate) -> Result<CourierHandle, CourierError> {
        let handle = CourierHandle(crated.tracking_code.to_string());
        self.crates.lock().unwrap().push(crated);
        Ok(handle)
    }
}

/// Write-side tracking fake recording the sequence of calls.
#[derive(Default)]
pub struct RecordingTracking {
    calls: Mutex<Vec<&'static str>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingTracking {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ParcelTracking for RecordingTracking {
    async fn update_sent(
        &self,
        _code: TrackingCode,
        _parcel: &Parcel,
        _metadata: BTreeMap<String, String>,
    ) -> Result<(), TrackingError> {
        self.record("sent");
        Ok(())
    }

    async fn update_addressed(
        &self,
        _code: TrackingCode,
        _channel: &Channel,
    ) -> Result<(), TrackingError> {
        self.record("addressed");
        Ok(())
    }

    async fn update_attempting(
        &self,
        _code: TrackingCode,
        _details: &HarnessDetails,
    ) -> Result<(), TrackingError> {
        self.record("attempting");
        Ok(())
    }

    async fn update_rejected(
        &self,
        _code: TrackingCode,
        message: &str,
    ) -> Result<(), TrackingError> {
        self.record("rejected");
        self.errors.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn update_aborted(&self, _code: TrackingCode, reason: &str) -> Result<(), TrackingError> {
        self.record("aborted");
        self.errors.lock().unwrap().push(reason.to_string());
        Ok(())
    }

    async fn update_delivered(&self, _code: TrackingCode) -> Result<(), TrackingError> {
        self.record("delivered");
        Ok(())
    }
}

/// Sender fake recording every parcel handed over for (re)sending.
#[derive(Default)]
pub struct RecordingSender {
    sends: Mutex<Vec<(Parcel, SendOptions)>>,
}

impl RecordingSender {
    pub fn sends(&self) -> Vec<(Parcel, SendOptions)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn parcels(&self) -> Vec<Parcel> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(parcel, _)| parcel.clone())
            .collect()
    }
}

#[async_trait]
impl SendParcels for RecordingSender {
    async fn send(&self, parcel: Parcel, options: SendOptions) -> Result<TrackingCode, SendError> {
        let code = TrackingCode::new(parcel.id, parcel.envelopes[0].id);
        self.sends.lock().unwrap().push((parcel, options));
        Ok(code)
    }
}
