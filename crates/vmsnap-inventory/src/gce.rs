//! Compute Engine aggregated-list provider

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument, warn};
use url::Url;
use vmsnap_gcp::{GcpClient, endpoint_url};

use crate::error::InventoryError;
use crate::provider::{ComputeProvider, ZoneBatchStream};
use crate::types::InstanceAggregatedList;

/// Largest page size the Compute API accepts
pub const MAX_PAGE_SIZE: u32 = 500;

/// Lists instances through `GET /compute/v1/projects/{project}/aggregated/instances`
pub struct GceComputeProvider {
    client: GcpClient,
    base_url: Url,
    page_size: u32,
}

impl GceComputeProvider {
    /// Create a provider for the given API root (normally `https://compute.googleapis.com`)
    ///
    /// # Errors
    /// Returns an error if the endpoint URL is invalid.
    pub fn new(client: GcpClient, endpoint: impl AsRef<str>) -> Result<Self, InventoryError> {
        let base_url = Url::parse(endpoint.as_ref())
            .map_err(|e| InventoryError::ConfigError(format!("compute endpoint: {e}")))?;
        Ok(Self {
            client,
            base_url,
            page_size: MAX_PAGE_SIZE,
        })
    }

    /// Set page size, clamped to `1..=500`
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<InstanceAggregatedList, InventoryError> {
        let mut url = endpoint_url(
            &self.base_url,
            &[
                "compute",
                "v1",
                "projects",
                project_id,
                "aggregated",
                "instances",
            ],
        )?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", &self.page_size.to_string());
            query.append_pair("returnPartialSuccess", "true");
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let page: InstanceAggregatedList = self.client.get_json(url).await?;

        if !page.unreachables.is_empty() {
            warn!(unreachables = ?page.unreachables, "some zones could not be listed");
        }
        debug!(scopes = page.items.len(), "fetched listing page");

        Ok(page)
    }
}

impl ComputeProvider for GceComputeProvider {
    fn name(&self) -> &str {
        "gce"
    }

    fn aggregated_instances<'a>(&'a self, project_id: &'a str) -> ZoneBatchStream<'a> {
        let start = (Cursor::Next(None), Vec::new());
        let pages = stream::try_unfold(start, move |(cursor, mut unreachables)| async move {
            let page_token = match cursor {
                Cursor::Done => return Ok::<_, InventoryError>(None),
                Cursor::Unreachable => return Err(InventoryError::Unreachable(unreachables)),
                Cursor::Next(page_token) => page_token,
            };

            let mut page = self.fetch_page(project_id, page_token.as_deref()).await?;
            unreachables.append(&mut page.unreachables);

            let next = match page.next_page_token.take().filter(|token| !token.is_empty()) {
                Some(token) => Cursor::Next(Some(token)),
                None if !unreachables.is_empty() => Cursor::Unreachable,
                None => Cursor::Done,
            };

            Ok(Some((page, (next, unreachables))))
        });

        pages
            .map_ok(|page| stream::iter(page.items.into_iter().map(Ok::<_, InventoryError>)))
            .try_flatten()
            .boxed()
    }
}

/// Listing position between pages
enum Cursor {
    /// Fetch a page; `None` is the first one
    Next(Option<String>),
    /// Every page was read but some scopes were not reachable
    Unreachable,
    Done,
}
