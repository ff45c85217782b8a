//! Domain model (ids, channels, envelopes, topics, tracking, events, ...).

pub mod channel;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod ids;
pub mod messages;
pub mod outcome;
pub mod schedule;
pub mod shares;
pub mod topic;
pub mod tracking;
pub mod type_descriptor;

pub use channel::{CHANNEL_NAME_MAX_LEN, Channel, ChannelError};
pub use envelope::{Envelope, Parcel, SealedPayload};
pub use errors::{
    CourierError, DispatchError, EnvelopeError, HandlerError, SendError, TrackingError,
};
pub use events::{EnvelopeTracking, EventRecord, Shipment, ShipmentEvent};
pub use ids::{EnvelopeId, ParcelId};
pub use messages::{
    AbortIfNoDependencyTopicsAffectedMessage, NullMessage, RecurringHeaderMessage,
    RescheduleIfNoNewCertifiedNoticesMessage, TopicBeingAffectedMessage, TopicCheck,
    TopicWasAffectedMessage,
};
pub use outcome::{AbortDelivery, DeliveryOutcome};
pub use schedule::CronSchedule;
pub use shares::{SharedInterfaceState, SharedProperty};
pub use topic::{
    AffectedTopic, CertifiedNotice, DependencyTopic, Notice, TopicCheckStrategy, TopicStatus,
    TopicStatusReport,
};
pub use tracking::{
    HarnessDetails, ParcelStatus, ParcelTrackingReport, TrackingCode,
};
pub use type_descriptor::{TypeComparer, TypeDescriptor, TypeMatchStrategy};
