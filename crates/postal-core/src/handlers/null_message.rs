//! No-op handler for `NullMessage`.

use async_trait::async_trait;

use crate::domain::errors::HandlerError;
use crate::domain::messages::NullMessage;
use crate::domain::outcome::DeliveryOutcome;
use crate::typed::handler::{Handler, HandlerContext};

pub struct NullMessageHandler;

#[async_trait]
impl Handler<NullMessage> for NullMessageHandler {
    async fn handle(
        &mut self,
        _message: NullMessage,
        _ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        Ok(DeliveryOutcome::delivered())
    }
}
