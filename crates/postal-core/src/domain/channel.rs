//! Channel: a named destination queue serviced by a worker pool.
//!
//! Comparison is by name. The transport naming constraint (lowercase
//! alphanumeric/underscore, bounded length) is enforced at send time by the
//! post office, not at construction, so arbitrary names can still travel
//! through tracking reports and error messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum channel name length accepted by the transport.
pub const CHANNEL_NAME_MAX_LEN: usize = 20;

/// A named logical queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Channel {
    name: String,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the transport naming constraint.
    ///
    /// Violations fail fast at send time, not at dispatch time.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.name.is_empty() {
            return Err(ChannelError::EmptyName);
        }
        if self.name.len() > CHANNEL_NAME_MAX_LEN {
            return Err(ChannelError::NameTooLong {
                name: self.name.clone(),
                length: self.name.len(),
            });
        }
        let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_';
        if !self.name.chars().all(allowed) {
            return Err(ChannelError::InvalidName {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Violations of the transport naming constraint.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("cannot use an empty channel name")]
    EmptyName,

    #[error(
        "cannot use a channel name longer than {max} characters; '{name}' is {length} characters",
        max = CHANNEL_NAME_MAX_LEN
    )]
    NameTooLong { name: String, length: usize },

    #[error("channel name must be lowercase alphanumeric with underscores only; got '{name}'")]
    InvalidName { name: String },
}
