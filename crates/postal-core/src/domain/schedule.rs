//! Recurring schedule descriptor.
//!
//! The core never runs a cron scheduler itself; the descriptor rides along
//! on a crate so the courier can register a standing resubmission with the
//! host's job infrastructure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cron-style recurring schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    /// Five-field cron expression, interpreted by the host scheduler.
    pub expression: String,
}

impl CronSchedule {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Sends once every night.
    pub fn nightly() -> Self {
        Self::new("0 3 * * *")
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}
