//! Builds a [`SnapshotJob`] from configuration

use std::sync::Arc;

use tracing::info;
use vmsnap_gcp::{GcpClient, MetadataTokenProvider, StaticTokenProvider, TokenProvider};
use vmsnap_inventory::{GceComputeProvider, InventoryCollector};
use vmsnap_store::{BigQueryStore, SnapshotWriter, TableStore};

use crate::config::AppConfig;
use crate::error::CoreError;
use crate::job::SnapshotJob;

/// Pick the token source: a configured static token, else the metadata server
fn token_provider(config: &AppConfig) -> Result<Arc<dyn TokenProvider>, CoreError> {
    let provider: Arc<dyn TokenProvider> = match config.auth.access_token.as_deref() {
        Some(token) if !token.is_empty() => Arc::new(StaticTokenProvider::new(token)),
        _ => Arc::new(MetadataTokenProvider::new(&config.endpoints.metadata)?),
    };
    Ok(provider)
}

fn gcp_client(config: &AppConfig) -> Result<GcpClient, CoreError> {
    let tokens = token_provider(config)?;
    info!(tokens = tokens.provider_type(), "using access token source");
    Ok(GcpClient::new(tokens, config.auth.request_timeout())?)
}

fn collector(client: GcpClient, config: &AppConfig) -> Result<InventoryCollector, CoreError> {
    let provider = GceComputeProvider::new(client, &config.endpoints.compute)?
        .with_page_size(config.snapshot.page_size);
    Ok(InventoryCollector::new(Arc::new(provider)))
}

/// Build an instance lister that never touches BigQuery
///
/// Only the listing settings are checked; the destination may be unset.
///
/// # Errors
/// Returns an error if the page size is invalid or a client cannot be built
pub fn build_collector(config: &AppConfig) -> Result<InventoryCollector, CoreError> {
    config.validate_listing()?;
    collector(gcp_client(config)?, config)
}

/// Build the snapshot job against the real Google APIs
///
/// # Errors
/// Returns an error if the configuration is invalid or a client cannot be built
pub fn build_job(config: &AppConfig) -> Result<SnapshotJob, CoreError> {
    config.validate()?;

    let client = gcp_client(config)?;
    let collector = collector(client.clone(), config)?;
    let store = BigQueryStore::new(client, &config.endpoints.bigquery)?;
    let store_type = store.store_type();

    let snapshot = &config.snapshot;
    let writer = SnapshotWriter::new(
        Arc::new(store),
        &snapshot.destination_project,
        &snapshot.dataset,
    )
    .with_table_prefix(&snapshot.table_prefix);

    info!(
        source = %snapshot.source_project,
        destination = %format!("{}.{}", snapshot.destination_project, snapshot.dataset),
        store = store_type,
        "snapshot job configured"
    );

    Ok(SnapshotJob::new(collector, writer, &snapshot.source_project))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.snapshot.source_project = "src".to_string();
        config.snapshot.destination_project = "dst".to_string();
        config.snapshot.dataset = "ds".to_string();
        config
    }

    #[test]
    fn test_static_token_preferred() {
        let mut config = config();
        config.auth.access_token = Some("tok".to_string());
        assert_eq!(token_provider(&config).unwrap().provider_type(), "static");
    }

    #[test]
    fn test_metadata_token_by_default() {
        assert_eq!(token_provider(&config()).unwrap().provider_type(), "metadata");
    }

    #[test]
    fn test_build_job() {
        let job = build_job(&config()).unwrap();
        assert_eq!(job.source_project(), "src");
    }

    #[test]
    fn test_build_job_rejects_invalid_config() {
        let err = build_job(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn test_build_collector_without_destination() {
        let mut config = AppConfig::default();
        config.auth.access_token = Some("tok".to_string());
        assert!(build_collector(&config).is_ok());

        config.snapshot.page_size = 0;
        assert!(matches!(
            build_collector(&config).err().unwrap(),
            CoreError::ConfigError(_)
        ));
    }

    #[test]
    fn test_build_job_rejects_bad_endpoint() {
        let mut config = config();
        config.endpoints.compute = "not a url".to_string();
        assert!(build_job(&config).is_err());
    }
}
