//! Response types for the API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::records::InstanceRecord;

/// Message returned when the listing produced no instances
pub const NO_INSTANCES_MESSAGE: &str = "No instances found in the project.";

/// Body of an entry-function response
///
/// Serialized untagged: either a bare JSON string or a snapshot object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RunPayload {
    /// Human-readable message (no instances, internal error)
    Message(String),
    /// Successful snapshot
    Snapshot(SnapshotResponse),
}

impl RunPayload {
    /// Payload for an empty listing
    #[must_use]
    pub fn no_instances() -> Self {
        Self::Message(NO_INSTANCES_MESSAGE.to_string())
    }

    /// Payload for an unexpected failure
    pub fn internal_error(error: impl std::fmt::Display) -> Self {
        Self::Message(format!("Internal error: {error}"))
    }

    /// Payload for a written snapshot
    #[must_use]
    pub fn snapshot(instances: Vec<InstanceRecord>) -> Self {
        Self::Snapshot(SnapshotResponse::success(instances))
    }

    /// Records carried by this payload, empty for messages
    #[must_use]
    pub fn instances(&self) -> &[InstanceRecord] {
        match self {
            Self::Message(_) => &[],
            Self::Snapshot(snapshot) => &snapshot.instances,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotResponse {
    pub instances: Vec<InstanceRecord>,
    pub status: String,
    /// Set when the listing was incomplete and the snapshot may be missing rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SnapshotResponse {
    #[must_use]
    pub fn success(instances: Vec<InstanceRecord>) -> Self {
        Self {
            instances,
            status: "success".to_string(),
            warning: None,
        }
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_as_string() {
        let json = serde_json::to_value(RunPayload::no_instances()).unwrap();
        assert_eq!(json, serde_json::json!("No instances found in the project."));
    }

    #[test]
    fn test_snapshot_shape() {
        let payload = RunPayload::snapshot(vec![InstanceRecord::new("p", "vm1")]);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["instances"][0]["instance_name"], "vm1");
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn test_internal_error_embeds_text() {
        let payload = RunPayload::internal_error("boom");
        assert_eq!(payload, RunPayload::Message("Internal error: boom".to_string()));
        assert!(payload.instances().is_empty());
    }

    #[test]
    fn test_untagged_round_trip_picks_variant() {
        let snapshot: RunPayload =
            serde_json::from_str(r#"{"instances":[],"status":"success"}"#).unwrap();
        assert!(matches!(snapshot, RunPayload::Snapshot(_)));

        let message: RunPayload = serde_json::from_str(r#""hello""#).unwrap();
        assert!(matches!(message, RunPayload::Message(_)));
    }
}
