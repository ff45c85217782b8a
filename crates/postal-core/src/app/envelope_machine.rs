//! EnvelopeMachine: stuffs messages into envelopes and opens them back.
//!
//! Stuffing serializes (serde_json) and gzip-compresses the message, then
//! binds the bytes to the message's declared type and channel. Opening
//! checks the wire descriptor against the requested local type under the
//! configured match strategy before decompressing and deserializing, so
//! round-tripping stays type-safe across transport boundaries.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::domain::envelope::{Envelope, SealedPayload};
use crate::domain::errors::EnvelopeError;
use crate::domain::ids::EnvelopeId;
use crate::domain::type_descriptor::{TypeComparer, TypeMatchStrategy};
use crate::ports::id_generator::IdGenerator;
use crate::typed::message::{AddressedMessage, Message};

pub struct EnvelopeMachine {
    strategy: TypeMatchStrategy,
    ids: Arc<dyn IdGenerator>,
}

impl EnvelopeMachine {
    pub fn new(strategy: TypeMatchStrategy, ids: Arc<dyn IdGenerator>) -> Self {
        Self { strategy, ids }
    }

    pub fn strategy(&self) -> TypeMatchStrategy {
        self.strategy
    }

    /// Pack a message into an envelope, with a caller-supplied id or a fresh
    /// one.
    pub fn stuff<M: Message>(
        &self,
        addressed: AddressedMessage<M>,
        id: Option<EnvelopeId>,
    ) -> Result<Envelope, EnvelopeError> {
        let description = addressed.message.description();
        let payload = seal(&serde_json::to_value(&addressed.message)?)?;
        Ok(Envelope::new(
            id.unwrap_or_else(|| self.ids.generate_envelope_id()),
            description,
            addressed.address,
            payload,
            M::descriptor(),
        ))
    }

    /// Open an envelope as a specific message type.
    ///
    /// Fails when no local type satisfies the match strategy.
    pub fn open<M: Message>(&self, envelope: &Envelope) -> Result<M, EnvelopeError> {
        let comparer = TypeComparer::new(self.strategy);
        if !comparer.matches(&envelope.message_type, &M::descriptor()) {
            return Err(EnvelopeError::TypeMismatch {
                expected: M::descriptor(),
                found: envelope.message_type.clone(),
            });
        }
        let value = self.open_raw(envelope)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Open an envelope without binding to a local type.
    ///
    /// The dispatcher uses this to hand the payload to a type-erased
    /// handler; type matching happens at handler resolution.
    pub fn open_raw(&self, envelope: &Envelope) -> Result<serde_json::Value, EnvelopeError> {
        if envelope.payload.is_empty() {
            return Err(EnvelopeError::MissingPayload);
        }
        let bytes = unseal(&envelope.payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn seal(value: &serde_json::Value) -> Result<SealedPayload, EnvelopeError> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(SealedPayload::new(encoder.finish()?))
}

fn unseal(payload: &SealedPayload) -> Result<Vec<u8>, EnvelopeError> {
    let mut decoder = GzDecoder::new(payload.bytes.as_slice());
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(bytes)
}
