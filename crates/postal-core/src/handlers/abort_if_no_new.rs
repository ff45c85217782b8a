//! Abort-if-no-dependency-topics-affected: permanent gate on fresh upstream
//! data.
//!
//! A dependency topic counts as "new" when its current report says
//! `WasAffected` and its completion time is strictly later than the
//! start-of-work snapshot recorded on the impacting topic's own report. A
//! dependency with no snapshot at all is new (first observation); a current
//! report with no completion time never beats anything. When the aggregate
//! check fails the parcel is aborted WITHOUT reschedule, dropped for good.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::HandlerError;
use crate::domain::messages::AbortIfNoDependencyTopicsAffectedMessage;
use crate::domain::outcome::DeliveryOutcome;
use crate::domain::topic::{DependencyTopic, TopicCheckStrategy, TopicStatus, TopicStatusReport};
use crate::typed::handler::{Handler, HandlerContext};

pub struct AbortIfNoDependencyTopicsAffectedMessageHandler;

fn completed_or_min(report: Option<&TopicStatusReport>) -> DateTime<Utc> {
    report
        .and_then(|r| r.affects_completed_time_utc)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn has_new_data(
    topic: &DependencyTopic,
    current_reports: &[TopicStatusReport],
    snapshots: &[TopicStatusReport],
) -> bool {
    let current = current_reports
        .iter()
        .find(|report| report.topic.name() == topic.name());
    let Some(current) = current else {
        return false;
    };
    if current.status != TopicStatus::WasAffected {
        return false;
    }

    let snapshot = snapshots
        .iter()
        .find(|report| report.topic.name() == topic.name());
    completed_or_min(Some(current)) > completed_or_min(snapshot)
}

#[async_trait]
impl Handler<AbortIfNoDependencyTopicsAffectedMessage>
    for AbortIfNoDependencyTopicsAffectedMessageHandler
{
    async fn handle(
        &mut self,
        message: AbortIfNoDependencyTopicsAffectedMessage,
        _ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        let own_report = message
            .topic_status_reports
            .iter()
            .find(|report| report.topic.name() == message.topic.name());
        let snapshots: &[TopicStatusReport] = own_report
            .map(|report| report.dependency_topic_notices_at_start.as_slice())
            .unwrap_or(&[]);

        let passes = match message.check_strategy {
            TopicCheckStrategy::None => true,
            TopicCheckStrategy::Any => message
                .dependency_topics
                .iter()
                .any(|topic| has_new_data(topic, &message.topic_status_reports, snapshots)),
            TopicCheckStrategy::All => message
                .dependency_topics
                .iter()
                .all(|topic| has_new_data(topic, &message.topic_status_reports, snapshots)),
        };

        if passes {
            Ok(DeliveryOutcome::delivered())
        } else {
            let topics = message
                .dependency_topics
                .iter()
                .map(|topic| topic.name())
                .collect::<Vec<_>>()
                .join(",");
            Ok(DeliveryOutcome::abort(format!(
                "No new data for topics; {topics}"
            )))
        }
    }
}
