//! vmsnap-api: Shared API types and schemas
//!
//! Contains the instance record written to snapshot tables and the payloads
//! returned by the entry function, used across the daemon, CLI, and core.

pub mod records;
pub mod responses;

pub use records::InstanceRecord;
pub use responses::{HealthResponse, RunPayload, SnapshotResponse};
