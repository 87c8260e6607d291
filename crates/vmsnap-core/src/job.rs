//! Snapshot entry function

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span, warn};
use vmsnap_api::{RunPayload, SnapshotResponse};
use vmsnap_inventory::InventoryCollector;
use vmsnap_store::SnapshotWriter;

use crate::error::CoreError;
use crate::trigger::Trigger;

/// Payload plus the HTTP-style status code of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleResponse {
    pub payload: RunPayload,
    pub status_code: u16,
}

impl HandleResponse {
    #[must_use]
    pub fn ok(payload: RunPayload) -> Self {
        Self {
            payload,
            status_code: 200,
        }
    }

    #[must_use]
    pub fn internal_error(error: &CoreError) -> Self {
        Self {
            payload: RunPayload::internal_error(error),
            status_code: 500,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Collects the source project's instances and appends them to today's table
pub struct SnapshotJob {
    collector: InventoryCollector,
    writer: SnapshotWriter,
    source_project: String,
}

impl SnapshotJob {
    pub fn new(
        collector: InventoryCollector,
        writer: SnapshotWriter,
        source_project: impl Into<String>,
    ) -> Self {
        Self {
            collector,
            writer,
            source_project: source_project.into(),
        }
    }

    #[must_use]
    pub fn source_project(&self) -> &str {
        &self.source_project
    }

    /// Run one snapshot
    ///
    /// Always answers: 200 with the no-instances message, 200 with the
    /// snapshot, or 500 with `Internal error: <text>` for anything that went
    /// wrong, panics included.
    pub async fn handle(&self, trigger: Trigger) -> HandleResponse {
        let span = info_span!(
            "snapshot",
            trigger = %trigger.source,
            received_at = %trigger.received_at,
            project = %self.source_project,
        );

        async {
            match AssertUnwindSafe(self.run()).catch_unwind().await {
                Ok(Ok(payload)) => HandleResponse::ok(payload),
                Ok(Err(e)) => {
                    error!(error = %e, "snapshot run failed");
                    HandleResponse::internal_error(&e)
                }
                Err(panic) => {
                    let e = CoreError::from_panic(panic.as_ref());
                    error!(error = %e, "snapshot run failed");
                    HandleResponse::internal_error(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self) -> Result<RunPayload, CoreError> {
        let collection = self.collector.collect(&self.source_project).await;

        if collection.is_empty() {
            match &collection.error {
                Some(e) => warn!(error = %e, "listing failed before any instance was found"),
                None => info!("no instances found in the project"),
            }
            return Ok(RunPayload::no_instances());
        }

        let report = self.writer.write_snapshot(&collection.records).await?;
        debug!(
            table = %report.table,
            created = report.created,
            inserted = report.inserted,
            rejected = report.row_errors.len(),
            "snapshot written"
        );

        let mut response = SnapshotResponse::success(collection.records);
        if let Some(e) = collection.error {
            warn!(error = %e, rows = response.instances.len(), "snapshot may be incomplete");
            response = response.with_warning(format!("instance listing incomplete: {e}"));
        }
        Ok(RunPayload::Snapshot(response))
    }
}
