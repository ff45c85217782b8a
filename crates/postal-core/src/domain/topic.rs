//! Topics and certified notices: cross-parcel coordination.
//!
//! A topic names a unit of work other parcels can depend on. A certified
//! notice records that work affecting the topic completed at a given time.
//! Reports and notices are read-model snapshots, rebuilt by projecting
//! shipment events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A topic in its "was/is being affected" role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffectedTopic(pub String);

impl AffectedTopic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AffectedTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A topic in its "someone else's work I depend on" role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyTopic(pub String);

impl DependencyTopic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicStatus {
    #[default]
    Unknown,
    BeingAffected,
    WasAffected,
    Failed,
}

/// Read-model snapshot of a topic's latest state.
///
/// `dependency_topic_notices_at_start` snapshots each dependency topic's
/// report as observed *before* the affecting work began; dependency-aware
/// handlers compare current reports against it to detect new data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStatusReport {
    pub topic: AffectedTopic,

    #[serde(default)]
    pub status: TopicStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affects_completed_time_utc: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_topic_notices_at_start: Vec<TopicStatusReport>,
}

impl TopicStatusReport {
    pub fn unknown(topic: AffectedTopic) -> Self {
        Self {
            topic,
            status: TopicStatus::Unknown,
            affects_completed_time_utc: None,
            dependency_topic_notices_at_start: Vec::new(),
        }
    }
}

/// One impacted item inside a certified notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub impacted_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impacted_time_start: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impacted_time_end: Option<DateTime<Utc>>,
}

/// The latest successfully certified payload for a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifiedNotice {
    pub group_key: String,
    pub delivered_time_utc: DateTime<Utc>,
    pub notices: Vec<Notice>,
}

/// How a set of per-topic checks is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicCheckStrategy {
    /// Always passes; no gating.
    None,
    /// At least one topic must pass.
    Any,
    /// Every topic must pass.
    All,
}
