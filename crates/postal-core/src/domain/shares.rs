//! Shared interface state: values one handler produces for a later handler
//! in the same parcel.
//!
//! Entries accumulate (appended, never overwritten) and lookup is
//! by interface type plus producing handler type so unrelated handlers that
//! happen to share a property name cannot cross-talk. The most recent
//! compatible entry wins.

use serde::{Deserialize, Serialize};

use super::type_descriptor::{TypeComparer, TypeDescriptor};

/// One named value under a shared interface, serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedProperty {
    pub name: String,
    pub value_json: String,
}

/// A capability interface value produced by one handler for consumption by a
/// later handler in the same parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedInterfaceState {
    pub interface_type: TypeDescriptor,
    pub source_handler_type: TypeDescriptor,
    pub properties: Vec<SharedProperty>,
}

impl SharedInterfaceState {
    pub fn property(&self, name: &str) -> Option<&SharedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Most recent state compatible with the given interface and producer.
pub fn find_latest<'a>(
    states: &'a [SharedInterfaceState],
    interface_type: &TypeDescriptor,
    source_handler_type: &TypeDescriptor,
    comparer: &TypeComparer,
) -> Option<&'a SharedInterfaceState> {
    states.iter().rev().find(|state| {
        comparer.matches(&state.interface_type, interface_type)
            && comparer.matches(&state.source_handler_type, source_handler_type)
    })
}
