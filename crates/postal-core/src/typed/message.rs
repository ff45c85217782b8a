//! Message trait: binds a Rust type to its wire identity.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::channel::Channel;
use crate::domain::type_descriptor::TypeDescriptor;

/// A message that can travel through the bus.
///
/// # Trait bounds
/// - `Serialize`/`DeserializeOwned`: envelope stuffing and opening
/// - `Send + Sync + 'static`: crossing worker task boundaries
///
/// # Identity
/// `NAMESPACE`/`NAME`/`VERSION` form the wire identity the receiving side
/// matches against, as loosely as its configured `TypeMatchStrategy` allows.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    const NAMESPACE: &'static str;
    const NAME: &'static str;

    /// Schema version; participates in the qualified name and in
    /// newest-version-wins resolution.
    const VERSION: u32 = 1;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::versioned(Self::NAMESPACE, Self::NAME, Self::VERSION)
    }

    /// Human-readable label carried on the envelope.
    fn description(&self) -> Option<String> {
        None
    }
}

/// A message plus the channel it should be delivered on.
#[derive(Debug, Clone)]
pub struct AddressedMessage<M: Message> {
    pub message: M,
    pub address: Option<Channel>,
}

impl<M: Message> AddressedMessage<M> {
    pub fn new(message: M, address: Channel) -> Self {
        Self {
            message,
            address: Some(address),
        }
    }

    /// Address-less: delivered wherever the parcel already is.
    pub fn unaddressed(message: M) -> Self {
        Self {
            message,
            address: None,
        }
    }
}
