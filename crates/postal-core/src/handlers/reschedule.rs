//! Reschedule-if-no-new-certified-notices: wait-and-retry gate on topic
//! recentness.
//!
//! Each check fetches the topic's latest certified notice through the
//! handler context and tests `now - delivered <= threshold`; an absent
//! notice is never recent. When the aggregate fails the handler sleeps the
//! configured wait interval, then aborts WITH reschedule so the same parcel
//! is retried later.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::HandlerError;
use crate::domain::messages::RescheduleIfNoNewCertifiedNoticesMessage;
use crate::domain::outcome::DeliveryOutcome;
use crate::domain::topic::TopicCheckStrategy;
use crate::typed::handler::{Handler, HandlerContext};

pub struct RescheduleIfNoNewCertifiedNoticesMessageHandler;

#[async_trait]
impl Handler<RescheduleIfNoNewCertifiedNoticesMessage>
    for RescheduleIfNoNewCertifiedNoticesMessageHandler
{
    async fn handle(
        &mut self,
        message: RescheduleIfNoNewCertifiedNoticesMessage,
        ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        let now = ctx.clock.now();

        let mut recent = Vec::with_capacity(message.topic_checks.len());
        for check in &message.topic_checks {
            let latest = ctx
                .tracking
                .latest_certified_notice(check.topic.name())
                .await
                .map_err(|err| HandlerError::new(err.to_string()))?;
            let threshold = chrono::Duration::from_std(check.recentness_threshold)
                .unwrap_or(chrono::Duration::MAX);
            let is_recent = latest
                .map(|notice| now.signed_duration_since(notice.delivered_time_utc) <= threshold)
                .unwrap_or(false);
            debug!(topic = %check.topic, is_recent, "certified notice recentness check");
            recent.push(is_recent);
        }

        let data_is_recent = match message.check_strategy {
            TopicCheckStrategy::All => recent.iter().all(|r| *r),
            TopicCheckStrategy::Any => recent.iter().any(|r| *r),
            TopicCheckStrategy::None => {
                return Err(HandlerError::new(
                    "unsupported topic check strategy: None",
                ));
            }
        };

        if data_is_recent {
            Ok(DeliveryOutcome::delivered())
        } else {
            tokio::time::sleep(message.wait_time_before_rescheduling).await;
            Ok(DeliveryOutcome::abort_and_reschedule(
                "Planned reschedule due to missing notice.",
                None,
            ))
        }
    }
}
