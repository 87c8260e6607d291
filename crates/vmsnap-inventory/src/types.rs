//! Compute Engine wire types
//!
//! Only the fields the collector reads are modelled; everything else in the
//! API response is ignored during deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One page of `instances.aggregatedList`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceAggregatedList {
    /// Per-scope results keyed by scope path (`zones/us-central1-a`)
    #[serde(default)]
    pub items: BTreeMap<String, InstancesScopedList>,
    /// Token for the next page, absent on the last page
    pub next_page_token: Option<String>,
    /// Scopes that could not be reached when partial success is requested
    #[serde(default)]
    pub unreachables: Vec<String>,
}

/// Instances of a single zone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstancesScopedList {
    #[serde(default)]
    pub instances: Vec<Instance>,
    /// Present instead of `instances` for zones with nothing to report
    pub warning: Option<Warning>,
}

impl InstancesScopedList {
    /// Create a zone batch holding the given instances
    #[must_use]
    pub fn with_instances(instances: Vec<Instance>) -> Self {
        Self {
            instances,
            warning: None,
        }
    }
}

/// A virtual machine instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    /// Lifecycle state (`PROVISIONING`, `RUNNING`, `TERMINATED`, ...)
    pub status: Option<String>,
}

impl Instance {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Some(status.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub code: Option<String>,
    pub message: Option<String>,
}
