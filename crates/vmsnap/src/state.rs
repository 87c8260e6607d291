//! Application state shared across HTTP handlers

use std::sync::Arc;

use vmsnap_core::{AppConfig, SnapshotJob};

/// Application state shared across all handlers
pub struct AppState {
    /// Snapshot pipeline run by every trigger
    pub job: SnapshotJob,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(job: SnapshotJob, config: AppConfig) -> Self {
        Self {
            job,
            config: Arc::new(config),
        }
    }
}
