//! IdGenerator port: distributed-safe id generation behind a trait.

use ulid::Ulid;

use super::clock::Clock;
use crate::domain::ids::{EnvelopeId, ParcelId};

/// Generates parcel and envelope ids.
pub trait IdGenerator: Send + Sync {
    fn generate_parcel_id(&self) -> ParcelId;
    fn generate_envelope_id(&self) -> EnvelopeId;
}

/// ULID-based generator driven by a `Clock`, so tests with a `FixedClock`
/// produce ids with a deterministic timestamp part.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_parcel_id(&self) -> ParcelId {
        ParcelId::from(self.next())
    }

    fn generate_envelope_id(&self) -> EnvelopeId {
        EnvelopeId::from(self.next())
    }
}
