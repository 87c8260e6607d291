//! Invocation triggers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What started a snapshot run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// HTTP request to the daemon
    Http,
    /// Scheduler event
    Schedule,
    /// Operator running the CLI
    Manual,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerSource::Http => "http",
            TriggerSource::Schedule => "schedule",
            TriggerSource::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Opaque invocation context, only used for log fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub source: TriggerSource,
    pub received_at: DateTime<Utc>,
}

impl Trigger {
    #[must_use]
    pub fn new(source: TriggerSource) -> Self {
        Self {
            source,
            received_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn http() -> Self {
        Self::new(TriggerSource::Http)
    }

    #[must_use]
    pub fn schedule() -> Self {
        Self::new(TriggerSource::Schedule)
    }

    #[must_use]
    pub fn manual() -> Self {
        Self::new(TriggerSource::Manual)
    }
}
