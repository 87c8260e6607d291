//! Error types for Google API calls

use thiserror::Error;

/// Errors that can occur when talking to Google APIs
#[derive(Error, Debug)]
pub enum GcpError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Endpoint cannot have path segments appended
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Access token could not be obtained
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl GcpError {
    /// HTTP status code, if the API answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            GcpError::Api { status, .. } => Some(*status),
            GcpError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Resource does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Resource already exists
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Caller lacks permission
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            GcpError::Http(e) => e.is_timeout() || e.is_connect(),
            GcpError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for Google API operations
pub type Result<T> = std::result::Result<T, GcpError>;
