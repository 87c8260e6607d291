//! Compute provider trait

use futures::stream::BoxStream;

use crate::error::InventoryError;
use crate::types::InstancesScopedList;

/// Scope key (e.g. `zones/us-central1-a`) paired with that scope's instances
pub type ZoneBatch = (String, InstancesScopedList);

/// Lazily fetched sequence of zone batches
pub type ZoneBatchStream<'a> = BoxStream<'a, Result<ZoneBatch, InventoryError>>;

/// Source of aggregated instance listings
///
/// Implementations fetch pages as the stream is polled. An `Err` item ends the
/// listing; batches yielded before it remain valid.
pub trait ComputeProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// List instances across all zones of `project_id`
    fn aggregated_instances<'a>(&'a self, project_id: &'a str) -> ZoneBatchStream<'a>;
}
