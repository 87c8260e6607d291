//! High-level inventory collection API

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tracing::{debug, error, info, instrument};
use vmsnap_api::InstanceRecord;

use crate::error::InventoryError;
use crate::provider::ComputeProvider;

/// Result of one listing pass
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Records gathered, in provider order
    pub records: Vec<InstanceRecord>,
    /// Set when the listing is incomplete; `records` holds what was gathered
    pub error: Option<InventoryError>,
}

impl Collection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the provider listing ran to the end
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Short zone name from a scope key or zone URL
///
/// `projects/p/zones/us-central1-a` and `zones/us-central1-a` both become
/// `us-central1-a`.
#[must_use]
pub fn zone_name(zone_path: &str) -> &str {
    zone_path
        .rsplit_once('/')
        .map_or(zone_path, |(_, zone)| zone)
}

/// Inventory collector
///
/// Flattens a provider's aggregated listing into instance records. Never fails:
/// errors stop the listing and are reported on the returned [`Collection`].
pub struct InventoryCollector {
    provider: Arc<dyn ComputeProvider>,
}

impl InventoryCollector {
    /// Create a new inventory collector
    pub fn new(provider: Arc<dyn ComputeProvider>) -> Self {
        Self { provider }
    }

    /// Collect all instances of a project
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn collect(&self, project_id: &str) -> Collection {
        info!("collecting instances");

        let mut records = Vec::new();
        let mut failure = None;
        let mut batches = self.provider.aggregated_instances(project_id);

        loop {
            let next = match AssertUnwindSafe(batches.next()).catch_unwind().await {
                Ok(next) => next,
                Err(payload) => Some(Err(InventoryError::from_panic(payload.as_ref()))),
            };

            let (zone_path, scoped) = match next {
                None => break,
                Some(Ok(batch)) => batch,
                Some(Err(e)) => {
                    error!(error = %e, collected = records.len(), "error while listing instances");
                    failure = Some(e);
                    break;
                }
            };

            if scoped.instances.is_empty() {
                debug!(zone = %zone_path, "no instances in zone");
                continue;
            }

            let zone = Some(zone_name(&zone_path))
                .filter(|z| !z.is_empty())
                .map(str::to_string);

            for instance in scoped.instances {
                let record = InstanceRecord {
                    project_id: project_id.to_string(),
                    instance_name: instance.name,
                    zone: zone.clone(),
                    status: instance.status,
                };
                info!(
                    instance = %record.instance_name,
                    zone = ?record.zone,
                    status = ?record.status,
                    "instance found"
                );
                records.push(record);
            }
        }

        debug!(records = ?records, "collected instances");
        info!(
            count = records.len(),
            complete = failure.is_none(),
            "inventory collection completed"
        );

        Collection {
            records,
            error: failure,
        }
    }
}
