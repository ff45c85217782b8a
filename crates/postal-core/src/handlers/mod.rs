//! Built-in handlers for the bus's own messages.
//!
//! Registered by the embedding application like any other handler; see the
//! CLI for the wiring.

pub mod abort_if_no_new;
pub mod null_message;
pub mod reschedule;
pub mod topic_affected;

pub use abort_if_no_new::AbortIfNoDependencyTopicsAffectedMessageHandler;
pub use null_message::NullMessageHandler;
pub use reschedule::RescheduleIfNoNewCertifiedNoticesMessageHandler;
pub use topic_affected::{TopicBeingAffectedMessageHandler, TopicWasAffectedMessageHandler};
