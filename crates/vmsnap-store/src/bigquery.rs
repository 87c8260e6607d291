//! BigQuery table store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;
use vmsnap_api::InstanceRecord;
use vmsnap_gcp::{GcpClient, endpoint_url};

use crate::error::StoreError;
use crate::schema::{FieldSchema, TableRef};
use crate::traits::{RowError, TableInfo, TableSchema, TableStore};

/// BigQuery v2 REST implementation of [`TableStore`]
pub struct BigQueryStore {
    client: GcpClient,
    base_url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTableRequest<'a> {
    table_reference: &'a TableRef,
    schema: SchemaRef<'a>,
}

#[derive(Serialize)]
struct SchemaRef<'a> {
    fields: &'a [FieldSchema],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllRequest<'a> {
    kind: &'static str,
    rows: Vec<InsertRow<'a>>,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    json: &'a InstanceRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<InsertErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct InsertErrorEntry {
    index: usize,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    reason: Option<String>,
    message: Option<String>,
}

impl ErrorProto {
    fn describe(&self) -> String {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) if !message.is_empty() => format!("{reason}: {message}"),
            (Some(reason), _) => reason.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

impl From<InsertErrorEntry> for RowError {
    fn from(entry: InsertErrorEntry) -> Self {
        Self {
            index: entry.index,
            reasons: entry.errors.iter().map(ErrorProto::describe).collect(),
        }
    }
}

impl BigQueryStore {
    /// Create a store for the given API root (normally `https://bigquery.googleapis.com`)
    ///
    /// # Errors
    /// Returns an error if the endpoint URL is invalid.
    pub fn new(client: GcpClient, endpoint: impl AsRef<str>) -> Result<Self, StoreError> {
        let base_url = Url::parse(endpoint.as_ref())
            .map_err(|e| StoreError::ConfigError(format!("bigquery endpoint: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn tables_url(&self, table: &TableRef) -> Result<Url, StoreError> {
        Ok(endpoint_url(
            &self.base_url,
            &[
                "bigquery",
                "v2",
                "projects",
                table.project_id.as_str(),
                "datasets",
                table.dataset_id.as_str(),
                "tables",
            ],
        )?)
    }

    fn table_url(&self, table: &TableRef, suffix: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.tables_url(table)?;
        url.path_segments_mut()
            .map_err(|()| StoreError::ConfigError(self.base_url.to_string()))?
            .push(&table.table_id)
            .extend(suffix);
        Ok(url)
    }
}

#[async_trait]
impl TableStore for BigQueryStore {
    #[instrument(skip(self, table), fields(table = %table))]
    async fn get_table(&self, table: &TableRef) -> Result<Option<TableInfo>, StoreError> {
        let url = self.table_url(table, &[])?;
        Ok(self.client.get_json_optional(url).await?)
    }

    #[instrument(skip(self, table, schema), fields(table = %table))]
    async fn create_table(
        &self,
        table: &TableRef,
        schema: &[FieldSchema],
    ) -> Result<(), StoreError> {
        let url = self.tables_url(table)?;
        let request = CreateTableRequest {
            table_reference: table,
            schema: SchemaRef { fields: schema },
        };

        let created: TableInfo = self.client.post_json(url, &request).await?;
        debug!(
            fields = created.schema.map_or(0, |s: TableSchema| s.fields.len()),
            "table created"
        );
        Ok(())
    }

    #[instrument(skip(self, table, rows), fields(table = %table, rows = rows.len()))]
    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[InstanceRecord],
    ) -> Result<Vec<RowError>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.table_url(table, &["insertAll"])?;
        let request = InsertAllRequest {
            kind: "bigquery#tableDataInsertAllRequest",
            rows: rows.iter().map(|json| InsertRow { json }).collect(),
        };

        let response: InsertAllResponse = self.client.post_json(url, &request).await?;
        Ok(response
            .insert_errors
            .into_iter()
            .map(RowError::from)
            .collect())
    }

    fn store_type(&self) -> &'static str {
        "bigquery"
    }
}
