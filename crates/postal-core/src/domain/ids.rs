//! Domain identifiers (strongly-typed IDs).
//!
//! ULID-based ids with a phantom-type marker so a `ParcelId` and an
//! `EnvelopeId` can never be mixed up at compile time. ULIDs sort by
//! creation time and can be generated on any worker without coordination.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for each id type.
///
/// Provides the prefix used by `Display` ("parcel-", "envelope-").
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic id type.
///
/// `T` is phantom: it takes no space at runtime but keeps the id types
/// distinct at compile time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker type for parcels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParcelMarker {}

impl IdMarker for ParcelMarker {
    fn prefix() -> &'static str {
        "parcel-"
    }
}

/// Marker type for envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnvelopeMarker {}

impl IdMarker for EnvelopeMarker {
    fn prefix() -> &'static str {
        "envelope-"
    }
}

/// Identifier of a Parcel (the unit of sending / sequencing).
pub type ParcelId = Id<ParcelMarker>;

/// Identifier of an Envelope (the unit of delivery / tracking).
pub type EnvelopeId = Id<EnvelopeMarker>;
