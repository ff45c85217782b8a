//! Standard messages understood by the bus itself.
//!
//! Everything here is plain data; the matching handlers live under
//! `crate::handlers`. The recurring header is special-cased by the
//! dispatcher and never reaches a handler.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::topic::{
    AffectedTopic, DependencyTopic, Notice, TopicCheckStrategy, TopicStatusReport,
};
use crate::typed::message::Message;

/// Namespace shared by the bus's own messages.
pub const MESSAGES_NAMESPACE: &str = "postal.messages";

/// A message that does nothing. Useful as a sequence placeholder and in
/// tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NullMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Message for NullMessage {
    const NAMESPACE: &'static str = MESSAGES_NAMESPACE;
    const NAME: &'static str = "NullMessage";

    fn description(&self) -> Option<String> {
        self.description.clone()
    }
}

/// Synthetic marker prepended to a recurring parcel so the dispatcher can
/// tell a scheduled re-trigger from genuine work. Dropped silently, never
/// tracked, never handled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurringHeaderMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Message for RecurringHeaderMessage {
    const NAMESPACE: &'static str = MESSAGES_NAMESPACE;
    const NAME: &'static str = "RecurringHeaderMessage";

    fn description(&self) -> Option<String> {
        self.description.clone()
    }
}

/// Announces that work affecting `topic` is beginning, snapshotting each
/// dependency topic's report as observed before the work started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicBeingAffectedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub topic: AffectedTopic,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_notices_at_start: Vec<TopicStatusReport>,
}

impl Message for TopicBeingAffectedMessage {
    const NAMESPACE: &'static str = MESSAGES_NAMESPACE;
    const NAME: &'static str = "TopicBeingAffectedMessage";

    fn description(&self) -> Option<String> {
        self.description.clone()
    }
}

/// Announces that work affecting `topic` completed; its delivery certifies
/// the attached notices for the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicWasAffectedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub topic: AffectedTopic,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl Message for TopicWasAffectedMessage {
    const NAMESPACE: &'static str = MESSAGES_NAMESPACE;
    const NAME: &'static str = "TopicWasAffectedMessage";

    fn description(&self) -> Option<String> {
        self.description.clone()
    }
}

/// One recentness requirement for `RescheduleIfNoNewCertifiedNoticesMessage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCheck {
    pub topic: DependencyTopic,
    pub recentness_threshold: Duration,
}

/// Gate: reschedule this parcel until every/any watched topic has a
/// certified notice recent enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleIfNoNewCertifiedNoticesMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub topic_checks: Vec<TopicCheck>,

    pub check_strategy: TopicCheckStrategy,

    /// Slept before the reschedule-abort is raised, to pace the retry loop.
    pub wait_time_before_rescheduling: Duration,
}

impl Message for RescheduleIfNoNewCertifiedNoticesMessage {
    const NAMESPACE: &'static str = MESSAGES_NAMESPACE;
    const NAME: &'static str = "RescheduleIfNoNewCertifiedNoticesMessage";

    fn description(&self) -> Option<String> {
        self.description.clone()
    }
}

/// Gate: abort this parcel permanently unless the dependency topics have new
/// data relative to the impacting topic's start-of-work snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortIfNoDependencyTopicsAffectedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The topic the surrounding parcel is affecting.
    pub topic: AffectedTopic,

    pub dependency_topics: Vec<DependencyTopic>,

    pub check_strategy: TopicCheckStrategy,

    /// Current reports, one per topic of interest, snapshotted at send time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_status_reports: Vec<TopicStatusReport>,
}

impl Message for AbortIfNoDependencyTopicsAffectedMessage {
    const NAMESPACE: &'static str = MESSAGES_NAMESPACE;
    const NAME: &'static str = "AbortIfNoDependencyTopicsAffectedMessage";

    fn description(&self) -> Option<String> {
        self.description.clone()
    }
}
