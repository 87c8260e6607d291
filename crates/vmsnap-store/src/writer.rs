//! Dated snapshot writer

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use vmsnap_api::InstanceRecord;

use crate::error::StoreError;
use crate::schema::{DEFAULT_TABLE_PREFIX, TableRef, snapshot_schema, snapshot_table_name};
use crate::traits::{RowError, TableStore};

/// Outcome of one snapshot write
#[derive(Debug, Clone)]
pub struct WriteReport {
    /// Destination table
    pub table: TableRef,
    /// Whether this call created the table
    pub created: bool,
    /// Rows the store accepted
    pub inserted: usize,
    /// Rows the store rejected
    pub row_errors: Vec<RowError>,
    /// Set when the insert request itself failed and no rows were written
    pub insert_error: Option<StoreError>,
}

impl WriteReport {
    /// Whether every row was written
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty() && self.insert_error.is_none()
    }
}

/// Summary used for the rows-inserted log line
#[derive(Serialize)]
struct RowErrorSummary<'a> {
    index: usize,
    instance: Option<&'a str>,
    reasons: &'a [String],
}

/// Snapshot writer
///
/// Appends records into one table per UTC calendar day, creating the table
/// with the fixed snapshot schema on first write of the day.
pub struct SnapshotWriter {
    store: Arc<dyn TableStore>,
    project_id: String,
    dataset_id: String,
    table_prefix: String,
}

impl SnapshotWriter {
    /// Create a writer for a destination dataset
    pub fn new(
        store: Arc<dyn TableStore>,
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    /// Set table name prefix
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Destination table for a given day
    #[must_use]
    pub fn table_for(&self, date: NaiveDate) -> TableRef {
        TableRef::new(
            &self.project_id,
            &self.dataset_id,
            snapshot_table_name(&self.table_prefix, date),
        )
    }

    /// Write records into today's (UTC) table
    ///
    /// # Errors
    /// Returns an error only if the table is missing and cannot be created.
    /// Insert failures are logged and reported on the [`WriteReport`].
    pub async fn write_snapshot(
        &self,
        records: &[InstanceRecord],
    ) -> Result<WriteReport, StoreError> {
        self.write_snapshot_on(Utc::now().date_naive(), records).await
    }

    /// Write records into the table for `date`
    ///
    /// # Errors
    /// Same as [`SnapshotWriter::write_snapshot`].
    #[instrument(skip(self, records), fields(rows = records.len()))]
    pub async fn write_snapshot_on(
        &self,
        date: NaiveDate,
        records: &[InstanceRecord],
    ) -> Result<WriteReport, StoreError> {
        let table = self.table_for(date);
        let created = self.ensure_table(&table).await?;

        let (row_errors, insert_error) = match self.store.insert_rows(&table, records).await {
            Ok(row_errors) => (row_errors, None),
            Err(e) => {
                error!(table = %table, error = %e, "insert request failed");
                (Vec::new(), Some(e))
            }
        };

        let inserted = if insert_error.is_some() {
            0
        } else {
            let rejected: BTreeSet<usize> = row_errors.iter().map(|e| e.index).collect();
            records.len().saturating_sub(rejected.len())
        };

        if !row_errors.is_empty() {
            let summary: Vec<RowErrorSummary<'_>> = row_errors
                .iter()
                .map(|e| RowErrorSummary {
                    index: e.index,
                    instance: records.get(e.index).map(|r| r.instance_name.as_str()),
                    reasons: &e.reasons,
                })
                .collect();
            error!(
                table = %table,
                rejected = row_errors.len(),
                errors = %serde_json::to_string(&summary).unwrap_or_default(),
                "errors inserting rows"
            );
        } else if insert_error.is_none() {
            info!(table = %table, inserted, "successfully inserted rows");
        }

        Ok(WriteReport {
            table,
            created,
            inserted,
            row_errors,
            insert_error,
        })
    }

    /// Make sure `table` exists, returning whether this call created it
    async fn ensure_table(&self, table: &TableRef) -> Result<bool, StoreError> {
        match self.store.get_table(table).await {
            Ok(Some(_)) => {
                info!(table = %table, "table already exists");
                return Ok(false);
            }
            Ok(None) => info!(table = %table, "table does not exist, creating"),
            Err(e) => warn!(table = %table, error = %e, "table lookup failed, attempting creation"),
        }

        match self.store.create_table(table, &snapshot_schema()).await {
            Ok(()) => {
                info!(table = %table, "created table");
                Ok(true)
            }
            Err(StoreError::AlreadyExists(_)) => {
                info!(table = %table, "table was created concurrently");
                Ok(false)
            }
            Err(e) => {
                error!(table = %table, error = %e, "failed to create table");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::schema::FieldSchema;
    use crate::traits::TableInfo;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Get(String),
        Create(String, Vec<FieldSchema>),
        Insert(String, usize),
    }

    #[derive(Default)]
    struct MockStore {
        exists: bool,
        lookup_fails: bool,
        create_error: Option<StoreError>,
        insert_result: Option<Result<Vec<RowError>, StoreError>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockStore {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn creates(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Create(..)))
                .count()
        }
    }

    #[async_trait]
    impl TableStore for MockStore {
        async fn get_table(&self, table: &TableRef) -> Result<Option<TableInfo>, StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Get(table.table_id.clone()));
            if self.lookup_fails {
                return Err(StoreError::Transport("timeout".to_string()));
            }
            Ok(self.exists.then(|| TableInfo {
                table_reference: table.clone(),
                schema: None,
                creation_time: None,
            }))
        }

        async fn create_table(
            &self,
            table: &TableRef,
            schema: &[FieldSchema],
        ) -> Result<(), StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(table.table_id.clone(), schema.to_vec()));
            match &self.create_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        async fn insert_rows(
            &self,
            table: &TableRef,
            rows: &[InstanceRecord],
        ) -> Result<Vec<RowError>, StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Insert(table.table_id.clone(), rows.len()));
            self.insert_result.clone().unwrap_or_else(|| Ok(Vec::new()))
        }

        fn store_type(&self) -> &'static str {
            "mock"
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn records() -> Vec<InstanceRecord> {
        vec![
            InstanceRecord::new("p", "vm1")
                .with_zone("us-central1-a")
                .with_status("RUNNING"),
            InstanceRecord::new("p", "vm2")
                .with_zone("us-central1-b")
                .with_status("TERMINATED"),
        ]
    }

    fn writer(store: &Arc<MockStore>) -> SnapshotWriter {
        SnapshotWriter::new(store.clone(), "analytics", "compute_status")
    }

    #[tokio::test]
    async fn test_missing_table_is_created_once_before_insert() {
        let store = Arc::new(MockStore::default());

        let report = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap();

        assert!(report.created);
        assert_eq!(report.inserted, 2);
        assert_eq!(
            store.calls(),
            vec![
                Call::Get("vm_status_20240309".to_string()),
                Call::Create("vm_status_20240309".to_string(), snapshot_schema()),
                Call::Insert("vm_status_20240309".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_table_skips_create() {
        let store = Arc::new(MockStore {
            exists: true,
            ..Default::default()
        });

        let report = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap();

        assert!(!report.created);
        assert_eq!(store.creates(), 0);
        assert_eq!(
            store.calls().last(),
            Some(&Call::Insert("vm_status_20240309".to_string(), 2))
        );
    }

    #[tokio::test]
    async fn test_already_exists_on_create_counts_as_success() {
        let store = Arc::new(MockStore {
            create_error: Some(StoreError::AlreadyExists("race".to_string())),
            ..Default::default()
        });

        let report = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap();

        assert!(!report.created);
        assert_eq!(report.inserted, 2);
        assert_eq!(store.creates(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_propagates_without_insert() {
        let store = Arc::new(MockStore {
            create_error: Some(StoreError::PermissionDenied("bigquery.tables.create".to_string())),
            ..Default::default()
        });

        let err = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::PermissionDenied(_)));
        assert!(
            !store
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Insert(..)))
        );
    }

    #[tokio::test]
    async fn test_lookup_error_falls_back_to_create() {
        let store = Arc::new(MockStore {
            lookup_fails: true,
            ..Default::default()
        });

        let report = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap();

        assert!(report.created);
        assert_eq!(store.creates(), 1);
    }

    #[tokio::test]
    async fn test_row_errors_are_reported_not_raised() {
        let store = Arc::new(MockStore {
            exists: true,
            insert_result: Some(Ok(vec![RowError {
                index: 0,
                reasons: vec!["invalid: bad row".to_string()],
            }])),
            ..Default::default()
        });

        let report = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.inserted, 1);
        assert_eq!(report.row_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_request_is_reported_not_raised() {
        let store = Arc::new(MockStore {
            exists: true,
            insert_result: Some(Err(StoreError::Transport("connection reset".to_string()))),
            ..Default::default()
        });

        let report = writer(&store)
            .write_snapshot_on(date(), &records())
            .await
            .unwrap();

        assert_eq!(report.inserted, 0);
        assert!(matches!(
            report.insert_error,
            Some(StoreError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let store = Arc::new(MockStore::default());
        let writer = writer(&store).with_table_prefix("fleet_");
        assert_eq!(writer.table_for(date()).table_id, "fleet_20240309");
        assert_eq!(writer.table_for(date()).project_id, "analytics");
        assert_eq!(writer.table_for(date()).dataset_id, "compute_status");
    }

    #[tokio::test]
    async fn test_write_snapshot_uses_todays_utc_table() {
        let store = Arc::new(MockStore {
            exists: true,
            ..Default::default()
        });
        let before = Utc::now().date_naive();

        let report = writer(&store).write_snapshot(&records()).await.unwrap();

        let after = Utc::now().date_naive();
        assert!(
            report.table.table_id == snapshot_table_name(DEFAULT_TABLE_PREFIX, before)
                || report.table.table_id == snapshot_table_name(DEFAULT_TABLE_PREFIX, after)
        );
    }
}
