//! Core error types for vmsnap-core

use std::any::Any;
use std::path::PathBuf;

use thiserror::Error;
use vmsnap_gcp::GcpError;
use vmsnap_inventory::InventoryError;
use vmsnap_store::StoreError;

/// Errors that can occur while configuring or running a snapshot
#[derive(Error, Debug)]
pub enum CoreError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// File that was tried
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`AppConfig`](crate::AppConfig)
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Google API client setup failed
    #[error(transparent)]
    Gcp(#[from] GcpError),

    /// Inventory provider setup failed
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Snapshot table could not be prepared
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Pipeline panicked
    #[error("snapshot run panicked: {0}")]
    Panicked(String),
}

impl CoreError {
    /// Build from a caught panic payload
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        CoreError::Panicked(vmsnap_inventory::panic_message(payload))
    }
}
