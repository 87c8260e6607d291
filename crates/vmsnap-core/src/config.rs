//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vmsnap_inventory::gce::MAX_PAGE_SIZE;
use vmsnap_store::schema::DEFAULT_TABLE_PREFIX;

use crate::error::CoreError;

/// Top-level configuration shared by the daemon and the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Source project and destination table settings
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// Credentials and request settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// API roots
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where instances are listed and where snapshots go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Project whose instances are listed
    #[serde(default)]
    pub source_project: String,
    /// Project holding the destination dataset
    #[serde(default)]
    pub destination_project: String,
    /// Destination dataset
    #[serde(default)]
    pub dataset: String,
    /// Prefix of the dated table name
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// Instances requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            source_project: String::new(),
            destination_project: String::new(),
            dataset: String::new(),
            table_prefix: default_table_prefix(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token; the metadata server is used when unset
    #[serde(default)]
    pub access_token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_compute_endpoint")]
    pub compute: String,
    #[serde(default = "default_bigquery_endpoint")]
    pub bigquery: String,
    #[serde(default = "default_metadata_endpoint")]
    pub metadata: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            compute: default_compute_endpoint(),
            bigquery: default_bigquery_endpoint(),
            metadata: default_metadata_endpoint(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_table_prefix() -> String {
    DEFAULT_TABLE_PREFIX.to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_compute_endpoint() -> String {
    "https://compute.googleapis.com".to_string()
}

fn default_bigquery_endpoint() -> String {
    "https://bigquery.googleapis.com".to_string()
}

fn default_metadata_endpoint() -> String {
    "http://metadata.google.internal".to_string()
}

impl AppConfig {
    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration
    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `VMSNAP_CONFIG` or the default paths, or use defaults
    ///
    /// Also returns the file that was read, `None` when defaults were used.
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default() -> Result<(Self, Option<PathBuf>), CoreError> {
        let explicit = std::env::var_os("VMSNAP_CONFIG").map(PathBuf::from);
        match find_config(explicit, &default_paths()) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((AppConfig::default(), None)),
        }
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    /// Returns error if `PORT` is set but not a port number
    pub fn apply_env(&mut self) -> Result<(), CoreError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    ///
    /// # Errors
    /// Returns error if `PORT` is set but not a port number
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("VMSNAP_SOURCE_PROJECT") {
            self.snapshot.source_project = v;
        }
        if let Some(v) = lookup("VMSNAP_BQ_PROJECT") {
            self.snapshot.destination_project = v;
        }
        if let Some(v) = lookup("VMSNAP_BQ_DATASET") {
            self.snapshot.dataset = v;
        }
        if let Some(v) = lookup("VMSNAP_LOG_LEVEL") {
            self.daemon.log_level = v;
        }
        if let Some(v) = lookup("GOOGLE_OAUTH_ACCESS_TOKEN").filter(|v| !v.is_empty()) {
            self.auth.access_token = Some(v);
        }
        if let Some(v) = lookup("PORT") {
            let port: u16 = v
                .trim()
                .parse()
                .map_err(|_| CoreError::ConfigError(format!("PORT is not a port number: {v}")))?;
            self.daemon.bind = format!("0.0.0.0:{port}");
        }
        Ok(())
    }

    /// Check the settings a snapshot run needs
    ///
    /// # Errors
    /// Returns the first invalid setting found
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("snapshot.source_project", &self.snapshot.source_project),
            ("snapshot.destination_project", &self.snapshot.destination_project),
            ("snapshot.dataset", &self.snapshot.dataset),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigError(format!("{name} must be set")));
            }
        }
        self.validate_listing()
    }

    /// Check only the settings an instance listing needs
    ///
    /// # Errors
    /// Returns an error if `snapshot.page_size` is out of range
    pub fn validate_listing(&self) -> Result<(), CoreError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.snapshot.page_size) {
            return Err(CoreError::ConfigError(format!(
                "snapshot.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.snapshot.page_size
            )));
        }
        Ok(())
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("vmsnap.toml"),
        PathBuf::from("/etc/vmsnap/vmsnap.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("vmsnap/vmsnap.toml"));
    }
    paths
}

/// An explicit path always wins, even when it does not exist
fn find_config(explicit: Option<PathBuf>, candidates: &[PathBuf]) -> Option<PathBuf> {
    explicit.or_else(|| candidates.iter().find(|path| path.exists()).cloned())
}
