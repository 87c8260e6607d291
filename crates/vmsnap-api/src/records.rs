//! Instance record types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row of a fleet snapshot
///
/// Field names match the snapshot table columns, so the serialized form is
/// the row body sent to the analytics store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InstanceRecord {
    /// Source project identifier
    pub project_id: String,
    /// Instance name, unique within a zone
    pub instance_name: String,
    /// Short zone name (e.g. `us-central1-a`)
    pub zone: Option<String>,
    /// Provider lifecycle state (e.g. `RUNNING`, `TERMINATED`)
    pub status: Option<String>,
}

impl InstanceRecord {
    /// Create a record with only the required fields
    pub fn new(project_id: impl Into<String>, instance_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            instance_name: instance_name.into(),
            zone: None,
            status: None,
        }
    }

    /// Set zone
    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Set status
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
