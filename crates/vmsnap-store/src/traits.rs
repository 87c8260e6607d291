//! Table store trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vmsnap_api::InstanceRecord;

use crate::error::StoreError;
use crate::schema::{FieldSchema, TableRef};

/// Metadata of an existing table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table_reference: TableRef,
    pub schema: Option<TableSchema>,
    /// Milliseconds since the epoch, as a decimal string
    pub creation_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// A row the store refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Position of the row in the inserted slice
    pub index: usize,
    /// Store-provided reasons
    pub reasons: Vec<String>,
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Look a table up, `None` when it does not exist
    async fn get_table(&self, table: &TableRef) -> Result<Option<TableInfo>, StoreError>;

    /// Create a table; `StoreError::AlreadyExists` if it is already there
    async fn create_table(&self, table: &TableRef, schema: &[FieldSchema])
    -> Result<(), StoreError>;

    /// Append rows, returning the rows that were rejected
    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[InstanceRecord],
    ) -> Result<Vec<RowError>, StoreError>;

    fn store_type(&self) -> &'static str;
}
