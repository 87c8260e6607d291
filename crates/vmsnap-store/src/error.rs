//! Error types for vmsnap-store

use thiserror::Error;
use vmsnap_gcp::GcpError;

/// Errors that can occur during table operations
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Table creation lost a race or the table was already there
    #[error("table already exists: {0}")]
    AlreadyExists(String),

    /// Dataset does not exist or is not visible
    #[error("not found: {0}")]
    NotFound(String),

    /// Insufficient permissions on the destination dataset
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Store answered with an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// Access token could not be obtained
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Failed to parse a store response
    #[error("parse error: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl StoreError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<GcpError> for StoreError {
    fn from(err: GcpError) -> Self {
        if err.is_conflict() {
            return StoreError::AlreadyExists(err.to_string());
        }
        if err.is_not_found() {
            return StoreError::NotFound(err.to_string());
        }
        if err.is_permission_denied() {
            return StoreError::PermissionDenied(err.to_string());
        }
        match err {
            GcpError::Api { status, message } => StoreError::Api { status, message },
            GcpError::Auth(message) => StoreError::Auth(message),
            GcpError::Json(e) => StoreError::ParseError(e.to_string()),
            GcpError::Http(e) if e.is_decode() => StoreError::ParseError(e.to_string()),
            GcpError::Url(e) => StoreError::ConfigError(e.to_string()),
            GcpError::InvalidEndpoint(e) => StoreError::ConfigError(e),
            GcpError::Http(e) => StoreError::Transport(e.to_string()),
        }
    }
}
