//! Authenticated JSON client for Google REST APIs

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::TokenProvider;
use crate::error::{GcpError, Result};

/// Append path segments to an API root
///
/// Segments are percent-encoded, so project, dataset and table identifiers
/// can be passed as-is.
///
/// # Errors
/// Returns an error if `base` cannot carry a path (e.g. `data:` URLs).
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| GcpError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into `GcpError::Api`
pub(crate) async fn error_for_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(GcpError::Api {
        status,
        message: extract_message(&body),
    })
}

/// Pull `error.message` out of a Google error envelope, falling back to the raw body
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// HTTP client that attaches a bearer token to every request
#[derive(Clone)]
pub struct GcpClient {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl GcpClient {
    /// Create a client with a per-request timeout
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(tokens: Arc<dyn TokenProvider>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, tokens })
    }


    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(builder.bearer_auth(token.token))
    }

    /// Perform a GET request and deserialize the response
    ///
    /// # Errors
    /// Returns an error if no token is available, the request fails, the API
    /// answers with a non-success status, or the body does not deserialize.
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let request = self.authorized(self.client.get(url)).await?;
        let response = error_for_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Perform a GET request, mapping 404 to `None`
    ///
    /// # Errors
    /// Same as [`GcpClient::get_json`] for every status other than 404.
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn get_json_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let request = self.authorized(self.client.get(url)).await?;
        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("resource not found");
            return Ok(None);
        }

        let response = error_for_status(response).await?;
        Ok(Some(response.json().await?))
    }

    /// Perform a POST request with a JSON body
    ///
    /// # Errors
    /// Same as [`GcpClient::get_json`].
    #[instrument(skip(self, url, body), fields(url = %url))]
    pub async fn post_json<T, B>(&self, url: Url, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let request = self.authorized(self.client.post(url).json(body)).await?;
        let response = error_for_status(request.send().await?).await?;
        Ok(response.json().await?)
    }
}
