//! Error types, one enum per concern.
//!
//! Structural dispatch errors are terminal for the dispatch call and
//! propagate to the host scheduler; aborts are NOT errors (see
//! `domain::outcome`).

use thiserror::Error;

use super::type_descriptor::TypeDescriptor;

/// Unhandled failure from a message handler.
///
/// Recorded as Rejected with full detail, then re-raised so the host's job
/// infrastructure can apply its own retry/backoff.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("json decode: {err}"))
    }
}

/// Failures while stuffing or opening envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope has no message payload")]
    MissingPayload,

    #[error("no local type satisfies the match strategy: wire type {found}, wanted {expected}")]
    TypeMismatch {
        expected: TypeDescriptor,
        found: TypeDescriptor,
    },

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("payload compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// Failures submitting a crate to the courier.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("courier is shut down")]
    Closed,

    #[error("courier submission failed: {0}")]
    Submission(String),
}

/// Failures in the tracking system.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("event store failure: {0}")]
    Store(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Failures accepting a parcel for sending.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("parcel must contain envelopes")]
    NoEnvelopes,

    #[error(transparent)]
    InvalidChannel(#[from] super::channel::ChannelError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Courier(#[from] CourierError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

/// Failures of a single dispatch call. All are terminal for that call; the
/// host scheduler decides whether to retry the job.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("parcel must contain envelopes")]
    EmptyParcel,

    #[error("message type not specified in envelope")]
    MessageTypeNotSpecified,

    #[error("first message in parcel deserialized to null")]
    NullMessage,

    #[error("unable to find handler for message type {0}")]
    NoHandler(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}
