//! No-op handlers for the topic lifecycle messages.
//!
//! Delivering these messages is the whole point: the tracking projection
//! records topic status and certified notices from their Delivered events,
//! so the handlers themselves do nothing.

use async_trait::async_trait;

use crate::domain::errors::HandlerError;
use crate::domain::messages::{TopicBeingAffectedMessage, TopicWasAffectedMessage};
use crate::domain::outcome::DeliveryOutcome;
use crate::typed::handler::{Handler, HandlerContext};

pub struct TopicBeingAffectedMessageHandler;

#[async_trait]
impl Handler<TopicBeingAffectedMessage> for TopicBeingAffectedMessageHandler {
    async fn handle(
        &mut self,
        _message: TopicBeingAffectedMessage,
        _ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        Ok(DeliveryOutcome::delivered())
    }
}

pub struct TopicWasAffectedMessageHandler;

#[async_trait]
impl Handler<TopicWasAffectedMessage> for TopicWasAffectedMessageHandler {
    async fn handle(
        &mut self,
        _message: TopicWasAffectedMessage,
        _ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        Ok(DeliveryOutcome::delivered())
    }
}
