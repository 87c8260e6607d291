//! Snapshot table naming and schema

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default prefix for dated snapshot tables
pub const DEFAULT_TABLE_PREFIX: &str = "vm_status_";

/// Fully-qualified table reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// Column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Timestamp,
    Boolean,
    /// Any type this crate does not create
    #[serde(other)]
    Other,
}

/// Column mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Required,
    #[default]
    Nullable,
    Repeated,
}

/// One column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType, mode: FieldMode) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode,
        }
    }
}

/// Fixed schema of every snapshot table
#[must_use]
pub fn snapshot_schema() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new("project_id", FieldType::String, FieldMode::Required),
        FieldSchema::new("instance_name", FieldType::String, FieldMode::Required),
        FieldSchema::new("zone", FieldType::String, FieldMode::Nullable),
        FieldSchema::new("status", FieldType::String, FieldMode::Nullable),
    ]
}

/// Table name for a calendar day, e.g. `vm_status_20240131`
#[must_use]
pub fn snapshot_table_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}{}", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_uses_compact_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(
            snapshot_table_name(DEFAULT_TABLE_PREFIX, date),
            "vm_status_20240105"
        );
    }

    #[test]
    fn test_schema_serializes_to_bigquery_fields() {
        let json = serde_json::to_value(snapshot_schema()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "project_id", "type": "STRING", "mode": "REQUIRED"},
                {"name": "instance_name", "type": "STRING", "mode": "REQUIRED"},
                {"name": "zone", "type": "STRING", "mode": "NULLABLE"},
                {"name": "status", "type": "STRING", "mode": "NULLABLE"}
            ])
        );
    }

    #[test]
    fn test_table_ref_display() {
        let table = TableRef::new("analytics", "compute_status", "vm_status_20240105");
        assert_eq!(table.to_string(), "analytics.compute_status.vm_status_20240105");
    }
}
