//! Tracking ports: append-only write side, query-only read side.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::channel::Channel;
use crate::domain::envelope::Parcel;
use crate::domain::errors::TrackingError;
use crate::domain::topic::{AffectedTopic, CertifiedNotice, TopicStatus, TopicStatusReport};
use crate::domain::tracking::{HarnessDetails, ParcelTrackingReport, TrackingCode};

/// Write side: each call appends one lifecycle event for a tracking code.
#[async_trait]
pub trait ParcelTracking: Send + Sync {
    /// Begin tracking a parcel.
    async fn update_sent(
        &self,
        code: TrackingCode,
        parcel: &Parcel,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), TrackingError>;

    /// The envelope was assigned a channel.
    async fn update_addressed(
        &self,
        code: TrackingCode,
        channel: &Channel,
    ) -> Result<(), TrackingError>;

    /// A harness began executing the handler.
    async fn update_attempting(
        &self,
        code: TrackingCode,
        details: &HarnessDetails,
    ) -> Result<(), TrackingError>;

    /// The handler failed with an unhandled error.
    async fn update_rejected(&self, code: TrackingCode, message: &str)
    -> Result<(), TrackingError>;

    /// The handler intentionally aborted delivery.
    async fn update_aborted(&self, code: TrackingCode, reason: &str) -> Result<(), TrackingError>;

    /// The handler completed successfully.
    async fn update_delivered(&self, code: TrackingCode) -> Result<(), TrackingError>;
}

/// Read side: side-effect-free report queries over the projected read model.
///
/// The read model may lag the event log; callers poll for propagation.
#[async_trait]
pub trait TrackingReports: Send + Sync {
    /// Current status per code; `Unknown` for codes never observed.
    async fn tracking_report(
        &self,
        codes: &[TrackingCode],
    ) -> Result<Vec<ParcelTrackingReport>, TrackingError>;

    /// The latest report for a topic, optionally only when it matches a
    /// specific status. `None` when nothing (matching) was recorded yet.
    async fn latest_topic_status(
        &self,
        topic: &AffectedTopic,
        filter: Option<TopicStatus>,
    ) -> Result<Option<TopicStatusReport>, TrackingError>;

    /// The latest certified notice for a topic group key, if any.
    async fn latest_certified_notice(
        &self,
        group_key: &str,
    ) -> Result<Option<CertifiedNotice>, TrackingError>;
}
