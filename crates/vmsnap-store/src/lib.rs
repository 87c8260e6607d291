//! vmsnap-store: Snapshot table storage
//!
//! Provides the table store abstraction, the BigQuery implementation, and the
//! snapshot writer that ensures a dated table exists before appending rows.

pub mod bigquery;
pub mod error;
pub mod schema;
pub mod traits;
pub mod writer;

pub use bigquery::BigQueryStore;
pub use error::StoreError;
pub use schema::{FieldMode, FieldSchema, FieldType, TableRef, snapshot_schema, snapshot_table_name};
pub use traits::{RowError, TableInfo, TableStore};
pub use writer::{SnapshotWriter, WriteReport};
