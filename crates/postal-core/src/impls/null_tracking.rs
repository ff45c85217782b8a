//! Null tracking: records nothing, reports nothing.
//!
//! For embeddings that do not care about tracking, and for tests that only
//! exercise dispatch control flow.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::channel::Channel;
use crate::domain::envelope::Parcel;
use crate::domain::errors::TrackingError;
use crate::domain::topic::{AffectedTopic, CertifiedNotice, TopicStatus, TopicStatusReport};
use crate::domain::tracking::{HarnessDetails, ParcelTrackingReport, TrackingCode};
use crate::ports::tracking::{ParcelTracking, TrackingReports};

pub struct NullParcelTracking;

#[async_trait]
impl ParcelTracking for NullParcelTracking {
    async fn update_sent(
        &self,
        _code: TrackingCode,
        _parcel: &Parcel,
        _metadata: BTreeMap<String, String>,
    ) -> Result<(), TrackingError> {
        Ok(())
    }

    async fn update_addressed(
        &self,
        _code: TrackingCode,
        _channel: &Channel,
    ) -> Result<(), TrackingError> {
        Ok(())
    }

    async fn update_attempting(
        &self,
        _code: TrackingCode,
        _details: &HarnessDetails,
    ) -> Result<(), TrackingError> {
        Ok(())
    }

    async fn update_rejected(
        &self,
        _code: TrackingCode,
        _message: &str,
    ) -> Result<(), TrackingError> {
        Ok(())
    }

    async fn update_aborted(
        &self,
        _code: TrackingCode,
        _reason: &str,
    ) -> Result<(), TrackingError> {
        Ok(())
    }

    async fn update_delivered(&self, _code: TrackingCode) -> Result<(), TrackingError> {
        Ok(())
    }
}

#[async_trait]
impl TrackingReports for NullParcelTracking {
    async fn tracking_report(
        &self,
        codes: &[TrackingCode],
    ) -> Result<Vec<ParcelTrackingReport>, TrackingError> {
        Ok(codes
            .iter()
            .map(|code| ParcelTrackingReport::unknown(*code))
            .collect())
    }

    async fn latest_topic_status(
        &self,
        _topic: &AffectedTopic,
        _filter: Option<TopicStatus>,
    ) -> Result<Option<TopicStatusReport>, TrackingError> {
        Ok(None)
    }

    async fn latest_certified_notice(
        &self,
        _group_key: &str,
    ) -> Result<Option<CertifiedNotice>, TrackingError> {
        Ok(None)
    }
}
