//! HandlerRegistry: message type identity -> handler factory.
//!
//! The registry is assembled explicitly by the embedding application at
//! startup (no assembly scanning, no container) and used read-only by the
//! dispatcher. A factory, not an instance, is registered per message type
//! so every dispatch gets a fresh handler and the shared-state triad can
//! take `&mut self`.

use super::handler::{DynHandler, Handler, SharedState, StatefulTypedHandler, TypedHandler};
use super::message::Message;
use crate::domain::type_descriptor::{TypeComparer, TypeDescriptor, TypeMatchStrategy};

type HandlerFactory = Box<dyn Fn() -> Box<dyn DynHandler> + Send + Sync>;

struct Registration {
    descriptor: TypeDescriptor,
    version: u32,
    factory: HandlerFactory,
}

/// Registry of handler factories.
#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
}

/// Registration errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for message type '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Register a handler factory for message type `M`.
    pub fn register<M, H, F>(&mut self, factory: F) -> Result<(), RegistryError>
    where
        M: Message,
        H: Handler<M> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.insert(
            M::descriptor(),
            M::VERSION,
            Box::new(move || Box::new(TypedHandler::new(factory()))),
        )
    }

    /// Register a handler factory whose handler carries the shared-state
    /// triad.
    pub fn register_with_state<M, H, F>(&mut self, factory: F) -> Result<(), RegistryError>
    where
        M: Message,
        H: Handler<M> + SharedState + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.insert(
            M::descriptor(),
            M::VERSION,
            Box::new(move || Box::new(StatefulTypedHandler::new(factory()))),
        )
    }

    fn insert(
        &mut self,
        descriptor: TypeDescriptor,
        version: u32,
        factory: HandlerFactory,
    ) -> Result<(), RegistryError> {
        if self
            .registrations
            .iter()
            .any(|r| r.descriptor.qualified_name == descriptor.qualified_name)
        {
            return Err(RegistryError::AlreadyRegistered(descriptor.qualified_name));
        }
        self.registrations.push(Registration {
            descriptor,
            version,
            factory,
        });
        Ok(())
    }

    /// Construct a handler for the given wire type, matched under `strategy`.
    ///
    /// When a loose strategy matches several registrations, the newest
    /// registered version wins.
    pub fn resolve(
        &self,
        message_type: &TypeDescriptor,
        strategy: TypeMatchStrategy,
    ) -> Option<Box<dyn DynHandler>> {
        let comparer = TypeComparer::new(strategy);
        self.registrations
            .iter()
            .filter(|r| comparer.matches(&r.descriptor, message_type))
            .max_by_key(|r| r.version)
            .map(|r| (r.factory)())
    }

    pub fn registered_types(&self) -> Vec<TypeDescriptor> {
        self.registrations
            .iter()
            .map(|r| r.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
