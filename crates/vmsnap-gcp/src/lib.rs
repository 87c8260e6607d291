//! vmsnap-gcp: Google Cloud REST transport
//!
//! Provides access-token sources and an authenticated JSON client shared by the
//! Compute Engine inventory provider and the BigQuery snapshot store.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vmsnap_gcp::{GcpClient, MetadataTokenProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = Arc::new(MetadataTokenProvider::new("http://metadata.google.internal")?);
//! let client = GcpClient::new(tokens, Duration::from_secs(30))?;
//!
//! let base = url::Url::parse("https://compute.googleapis.com")?;
//! let url = vmsnap_gcp::endpoint_url(&base, &["compute", "v1", "projects", "my-project"])?;
//! let project: serde_json::Value = client.get_json(url).await?;
//! println!("{project}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AccessToken, MetadataTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::{GcpClient, endpoint_url};
pub use error::{GcpError, Result};
