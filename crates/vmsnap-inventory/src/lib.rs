//! vmsnap-inventory: Compute Engine inventory collection
//!
//! Lists every instance across all zones of a project through an aggregated
//! listing and flattens the result into [`InstanceRecord`](vmsnap_api::InstanceRecord)s.

pub mod collector;
pub mod error;
pub mod gce;
pub mod provider;
pub mod types;

pub use collector::{Collection, InventoryCollector, zone_name};
pub use error::{InventoryError, panic_message};
pub use gce::GceComputeProvider;
pub use provider::{ComputeProvider, ZoneBatch, ZoneBatchStream};
