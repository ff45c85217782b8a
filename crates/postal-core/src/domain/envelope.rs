//! Envelope and Parcel: the wire-facing units of work.
//!
//! An envelope binds one serialized, compressed message to its declared type
//! and target channel. A parcel is an ordered sequence of envelopes plus the
//! shared handler state accumulated so far. Both are immutable once created;
//! the dispatcher builds *new* parcels when it forwards the remainder of a
//! sequence.

use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::ids::{EnvelopeId, ParcelId};
use super::shares::SharedInterfaceState;
use super::type_descriptor::TypeDescriptor;

/// Compressed serialized message bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    pub bytes: Vec<u8>,
}

impl SealedPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One serialized message addressed to a channel, with type metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Target channel. `None` means "wherever the parcel already is"
    /// (used by the recurring marker).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,

    pub payload: SealedPayload,

    pub message_type: TypeDescriptor,
}

impl Envelope {
    pub fn new(
        id: EnvelopeId,
        description: Option<String>,
        channel: Option<Channel>,
        payload: SealedPayload,
        message_type: TypeDescriptor,
    ) -> Self {
        Self {
            id,
            description,
            channel,
            payload,
            message_type,
        }
    }
}

/// Ordered sequence of envelopes plus accumulated shared handler state.
///
/// Envelopes are consumed front to back: the dispatcher always operates on
/// `envelopes[0]` and rebuilds a new parcel from the tail for forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,

    pub envelopes: Vec<Envelope>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_interface_states: Vec<SharedInterfaceState>,
}

impl Parcel {
    pub fn new(id: ParcelId, envelopes: Vec<Envelope>) -> Self {
        Self {
            id,
            envelopes,
            shared_interface_states: Vec::new(),
        }
    }

    pub fn lead(&self) -> Option<&Envelope> {
        self.envelopes.first()
    }

    /// The parcel that remains after the lead envelope completes, carrying
    /// the given (possibly extended) shared state forward.
    pub fn remainder(&self, shared_interface_states: Vec<SharedInterfaceState>) -> Self {
        Self {
            id: self.id,
            envelopes: self.envelopes[1..].to_vec(),
            shared_interface_states,
        }
    }
}
