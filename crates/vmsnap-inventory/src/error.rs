//! Error types for vmsnap-inventory

use std::any::Any;

use thiserror::Error;
use vmsnap_gcp::GcpError;

/// Errors that can occur while listing instances
#[derive(Error, Debug, Clone)]
pub enum InventoryError {
    /// Caller cannot read the project's instances
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Compute API answered with an error status
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

    /// Failed to parse a listing page
    #[error("parse error: {0}")]
    ParseError(String),

    /// Listing finished but some scopes could not be reached
    #[error("unreachable scopes: {}", .0.join(", "))]
    Unreachable(Vec<String>),

    /// Provider panicked while producing results
    #[error("provider panicked: {0}")]
    Panicked(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl InventoryError {
    /// Check if error is retryable
    ///
    /// Informational only; listings are attempted once.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            InventoryError::Transport(_) => true,
            InventoryError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Build from a caught panic payload
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        InventoryError::Panicked(panic_message(payload))
    }
}

/// Text of a caught panic payload
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl From<GcpError> for InventoryError {
    fn from(err: GcpError) -> Self {
        if err.is_permission_denied() {
            return InventoryError::PermissionDenied(err.to_string());
        }
        match err {
            GcpError::Api { status, message } => InventoryError::Api { status, message },
            GcpError::Auth(message) => InventoryError::Auth(message),
            GcpError::Json(e) => InventoryError::ParseError(e.to_string()),
            GcpError::Http(e) if e.is_decode() => InventoryError::ParseError(e.to_string()),
            GcpError::Url(e) => InventoryError::ConfigError(e.to_string()),
            GcpError::InvalidEndpoint(e) => InventoryError::ConfigError(e),
            GcpError::Http(e) => InventoryError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcp_error_mapping() {
        let denied: InventoryError = GcpError::Api {
            status: 403,
            message: "no".to_string(),
        }
        .into();
        assert!(matches!(denied, InventoryError::PermissionDenied(_)));

        let unavailable: InventoryError = GcpError::Api {
            status: 503,
            message: "backend unavailable".to_string(),
        }
        .into();
        assert!(unavailable.is_retryable());

        let auth: InventoryError = GcpError::Auth("metadata".to_string()).into();
        assert!(matches!(auth, InventoryError::Auth(_)));
        assert!(!auth.is_retryable());
    }

    #[test]
    fn test_panic_payload_message() {
        let payload: Box<dyn Any + Send> = Box::new("exploded");
        assert_eq!(
            InventoryError::from_panic(payload.as_ref()).to_string(),
            "provider panicked: exploded"
        );

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(
            InventoryError::from_panic(payload.as_ref()).to_string(),
            "provider panicked: owned"
        );
    }

    #[test]
    fn test_panic_message_of_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
