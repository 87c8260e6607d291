//! Access-token sources

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use crate::client::{endpoint_url, error_for_status};
use crate::error::{GcpError, Result};

/// Tokens are refreshed this long before the server-reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth2 bearer token
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Token value sent as `Authorization: Bearer <token>`
    pub token: String,
    /// When the token stops being usable, `None` for tokens that never expire
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    /// Token without an expiry
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Check if the token should be refreshed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| Instant::now() + EXPIRY_MARGIN >= at)
    }
}

/// Source of bearer tokens for Google API calls
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a usable access token
    async fn access_token(&self) -> Result<AccessToken>;

    /// Short description for logs
    fn provider_type(&self) -> &'static str;
}

/// Fixed token supplied by configuration or environment
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if self.token.is_empty() {
            return Err(GcpError::Auth("static access token is empty".to_string()));
        }
        Ok(AccessToken::new(self.token.clone()))
    }

    fn provider_type(&self) -> &'static str {
        "static"
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Token source backed by the instance metadata server
///
/// Available on Compute Engine, Cloud Run and Cloud Functions. Tokens are
/// cached until shortly before they expire.
pub struct MetadataTokenProvider {
    client: Client,
    base_url: Url,
    cache: RwLock<Option<AccessToken>>,
}

impl MetadataTokenProvider {
    /// Create a provider for the given metadata server root
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url.as_ref())?,
            cache: RwLock::new(None),
        })
    }

    async fn fetch(&self) -> Result<AccessToken> {
        let url = endpoint_url(
            &self.base_url,
            &[
                "computeMetadata",
                "v1",
                "instance",
                "service-accounts",
                "default",
                "token",
            ],
        )?;

        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GcpError::Auth(format!("metadata server unreachable: {e}")))?;
        let response = error_for_status(response).await?;
        let body: MetadataTokenResponse = response.json().await?;

        Ok(AccessToken {
            token: body.access_token,
            expires_at: Some(Instant::now() + Duration::from_secs(body.expires_in)),
        })
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    #[instrument(skip(self))]
    async fn access_token(&self) -> Result<AccessToken> {
        {
            let cache = self.cache.read().await;
            if let Some(token) = cache.as_ref()
                && !token.is_expired()
            {
                return Ok(token.clone());
            }
        }

        debug!("refreshing access token from metadata server");
        let token = self.fetch().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(token.clone());
        Ok(token)
    }

    fn provider_type(&self) -> &'static str {
        "metadata"
    }
}
