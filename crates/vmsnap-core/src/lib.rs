//! vmsnap-core: Configuration and the snapshot entry function
//!
//! Wires the inventory collector and the snapshot writer into a
//! [`SnapshotJob`] whose [`handle`](SnapshotJob::handle) is the single entry
//! point used by the daemon and the CLI.

pub mod config;
pub mod error;
pub mod factory;
pub mod job;
pub mod logging;
pub mod trigger;

pub use config::{
    AppConfig, AuthConfig, DaemonConfig, EndpointsConfig, LogFormat, SnapshotConfig,
};
pub use error::CoreError;
pub use factory::{build_collector, build_job};
pub use job::{HandleResponse, SnapshotJob};
pub use trigger::{Trigger, TriggerSource};
