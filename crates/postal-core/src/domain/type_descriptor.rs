//! Message type identity and loose/exact matching.
//!
//! A serialized message travels with a `TypeDescriptor`; the receiving side
//! decides how strictly to compare it against locally known types via a
//! `TypeMatchStrategy`. Cross-version compatibility depends on the strategy,
//! so it is threaded through envelope opening and handler resolution rather
//! than hardcoded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a message type as carried on the wire.
///
/// `qualified_name` embeds the schema version (`{namespace}.{name}/v{n}`)
/// and is the exact identity; namespace + name are the loose identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub namespace: String,
    pub name: String,
    pub qualified_name: String,
}

impl TypeDescriptor {
    pub fn versioned(namespace: impl Into<String>, name: impl Into<String>, version: u32) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        let qualified_name = format!("{namespace}.{name}/v{version}");
        Self {
            namespace,
            name,
            qualified_name,
        }
    }

    /// Identity of a local Rust type, derived from its path.
    ///
    /// Used for handler and shared-state interface identities, which never
    /// travel across versions the way messages do.
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let (namespace, name) = match full.rsplit_once("::") {
            Some((ns, n)) => (ns.to_string(), n.to_string()),
            None => (String::new(), full.to_string()),
        };
        Self {
            namespace,
            name,
            qualified_name: full.to_string(),
        }
    }

    /// Structural validity: namespace, name and qualified identity must all
    /// be present; the dispatcher rejects anything less up front.
    pub fn is_complete(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty() && !self.qualified_name.is_empty()
    }

    /// Schema version parsed from the qualified name, if present.
    pub fn version(&self) -> Option<u32> {
        self.qualified_name.rsplit_once("/v")?.1.parse().ok()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}

/// How loosely a wire descriptor is matched against a local type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeMatchStrategy {
    /// Name only. The loosest match; tolerates namespace moves.
    Name,

    /// Namespace and name. Tolerates version bumps.
    NamespaceAndName,

    /// Full qualified identity including version.
    QualifiedName,
}

/// Applies a `TypeMatchStrategy` to descriptor pairs.
#[derive(Debug, Clone, Copy)]
pub struct TypeComparer {
    strategy: TypeMatchStrategy,
}

impl TypeComparer {
    pub fn new(strategy: TypeMatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn matches(&self, left: &TypeDescriptor, right: &TypeDescriptor) -> bool {
        match self.strategy {
            TypeMatchStrategy::Name => left.name == right.name,
            TypeMatchStrategy::NamespaceAndName => {
                left.namespace == right.namespace && left.name == right.name
            }
            TypeMatchStrategy::QualifiedName => left.qualified_name == right.qualified_name,
        }
    }
}
