//! Typed message/handler machinery and the handler registry.

pub mod handler;
pub mod message;
pub mod registry;

pub use handler::{
    DynHandler, Handler, HandlerContext, SharedState, StatefulTypedHandler, TypedHandler,
};
pub use message::{AddressedMessage, Message};
pub use registry::{HandlerRegistry, RegistryError};
