//! Handler traits and the type-erasure layer between them and the
//! dispatcher.
//!
//! A `Handler<M>` is typed; the dispatcher only sees `DynHandler` trait
//! objects produced by the registry. One handler instance is constructed per
//! dispatch, so handlers can hold per-delivery mutable state (the
//! shared-state triad relies on this).

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use super::message::Message;
use crate::domain::errors::HandlerError;
use crate::domain::outcome::DeliveryOutcome;
use crate::domain::shares::{SharedInterfaceState, SharedProperty};
use crate::domain::type_descriptor::TypeDescriptor;
use crate::ports::clock::Clock;
use crate::ports::tracking::TrackingReports;

/// Explicit context handed to every handler invocation.
///
/// Handlers can query tracking and the clock without knowing the transport;
/// there is no global service locator.
#[derive(Clone)]
pub struct HandlerContext {
    pub tracking: Arc<dyn TrackingReports>,
    pub clock: Arc<dyn Clock>,
}

impl HandlerContext {
    pub fn new(tracking: Arc<dyn TrackingReports>, clock: Arc<dyn Clock>) -> Self {
        Self { tracking, clock }
    }
}

/// Handles messages of type `M`.
///
/// Returning `Ok(Aborted(..))` is expected flow control; `Err` is an
/// unhandled failure that the dispatcher records as Rejected and re-raises.
#[async_trait]
pub trait Handler<M: Message>: Send {
    async fn handle(
        &mut self,
        message: M,
        ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError>;
}

/// The shared-state triad: a handler that produces a capability value for
/// later handlers in the same parcel (and can reuse one it produced in an
/// earlier envelope of the sequence).
pub trait SharedState {
    type State: Serialize + DeserializeOwned + Send;

    /// Interface identity the state is filed under.
    const INTERFACE_NAMESPACE: &'static str = "postal.shares";
    const INTERFACE_NAME: &'static str;

    /// Property name the state value is stored as.
    const PROPERTY: &'static str = "value";

    fn interface_descriptor() -> TypeDescriptor {
        TypeDescriptor::versioned(Self::INTERFACE_NAMESPACE, Self::INTERFACE_NAME, 1)
    }

    /// Produce a fresh state value.
    fn create_state(&self) -> Self::State;

    /// Is a previously stored state still usable?
    fn is_state_still_valid(&self, state: &Self::State) -> bool;

    /// Seed the handler with the state it will run under.
    fn pre_handle_with_state(&mut self, state: Self::State);
}

/// Object-safe handler abstraction the dispatcher works against.
#[async_trait]
pub trait DynHandler: Send {
    async fn handle_dyn(
        &mut self,
        payload: serde_json::Value,
        ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError>;

    /// Wire identity of the message this handler accepts.
    fn message_type(&self) -> TypeDescriptor;

    /// Identity of the handler itself (shared-state provenance).
    fn handler_type(&self) -> TypeDescriptor;

    /// Interface this handler files shared state under, if any.
    fn shared_interface(&self) -> Option<TypeDescriptor> {
        None
    }

    /// Seed the handler before invocation from the most recent compatible
    /// stored state (or a freshly created one).
    fn seed_shared_state(
        &mut self,
        prior: Option<&SharedInterfaceState>,
    ) -> Result<(), HandlerError> {
        let _ = prior;
        Ok(())
    }

    /// State to append to the parcel after a successful invocation.
    fn captured_state(&self) -> Option<SharedInterfaceState> {
        None
    }
}

/// Type-erasing wrapper for a plain handler.
pub struct TypedHandler<M: Message, H: Handler<M>> {
    handler: H,
    _marker: PhantomData<M>,
}

impl<M: Message, H: Handler<M>> TypedHandler<M, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<M: Message, H: Handler<M>> DynHandler for TypedHandler<M, H> {
    async fn handle_dyn(
        &mut self,
        payload: serde_json::Value,
        ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        let message: M = serde_json::from_value(payload)?;
        self.handler.handle(message, ctx).await
    }

    fn message_type(&self) -> TypeDescriptor {
        M::descriptor()
    }

    fn handler_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<H>()
    }
}

/// Type-erasing wrapper for a handler with the shared-state triad.
pub struct StatefulTypedHandler<M: Message, H: Handler<M> + SharedState> {
    handler: H,

    /// JSON of the state actually used this dispatch, captured before
    /// `pre_handle_with_state` consumes it.
    used_state_json: Option<String>,

    _marker: PhantomData<M>,
}

impl<M: Message, H: Handler<M> + SharedState> StatefulTypedHandler<M, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            used_state_json: None,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<M: Message, H: Handler<M> + SharedState> DynHandler for StatefulTypedHandler<M, H> {
    async fn handle_dyn(
        &mut self,
        payload: serde_json::Value,
        ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        let message: M = serde_json::from_value(payload)?;
        self.handler.handle(message, ctx).await
    }

    fn message_type(&self) -> TypeDescriptor {
        M::descriptor()
    }

    fn handler_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<H>()
    }

    fn shared_interface(&self) -> Option<TypeDescriptor> {
        Some(H::interface_descriptor())
    }

    fn seed_shared_state(
        &mut self,
        prior: Option<&SharedInterfaceState>,
    ) -> Result<(), HandlerError> {
        let stored: Option<H::State> = match prior.and_then(|p| p.property(H::PROPERTY)) {
            Some(prop) => Some(serde_json::from_str(&prop.value_json)?),
            None => None,
        };

        let state = match stored {
            Some(state) if self.handler.is_state_still_valid(&state) => state,
            _ => self.handler.create_state(),
        };

        let json =
            serde_json::to_string(&state).map_err(|e| HandlerError::new(e.to_string()))?;
        self.handler.pre_handle_with_state(state);
        self.used_state_json = Some(json);
        Ok(())
    }

    fn captured_state(&self) -> Option<SharedInterfaceState> {
        self.used_state_json
            .as_ref()
            .map(|json| SharedInterfaceState {
                interface_type: H::interface_descriptor(),
                source_handler_type: TypeDescriptor::of::<H>(),
                properties: vec![SharedProperty {
                    name: H::PROPERTY.to_string(),
                    value_json: json.clone(),
                }],
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler-layer tests.

    use super::*;
    use crate::impls::null_tracking::NullParcelTracking;
    use crate::ports::clock::SystemClock;

    pub fn context() -> HandlerContext {
        HandlerContext::new(Arc::new(NullParcelTracking), Arc::new(SystemClock))
    }
}
