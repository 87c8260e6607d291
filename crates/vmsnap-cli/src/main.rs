//! vmsnap CLI
//!
//! One-shot snapshot runs, dry-run listings, and remote triggers against a
//! running daemon.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use eyre::{WrapErr, bail};
use tracing::{debug, warn};
use url::Url;
use vmsnap_api::RunPayload;
use vmsnap_core::{AppConfig, Trigger, build_collector, build_job, logging};

#[derive(Parser)]
#[command(name = "vmsnap-cli")]
#[command(about = "Snapshot Compute Engine instances into BigQuery", long_about = None)]
struct Cli {
    /// Config file (defaults to `VMSNAP_CONFIG` or the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one snapshot and print the payload
    Run {
        /// Mark the run as scheduler-initiated
        #[arg(long)]
        scheduled: bool,
    },
    /// List instances without writing them
    Collect {
        /// Project to list instead of the configured source project
        #[arg(long)]
        project: Option<String>,
    },
    /// Ask a running daemon to take a snapshot
    Trigger {
        /// Daemon base URL
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server: Url,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}

/// Returns the config and the file it was read from, if any
fn load_config(cli: &Cli) -> Result<(AppConfig, Option<PathBuf>)> {
    let (mut config, source) = match &cli.config {
        Some(path) => (AppConfig::load(path)?, Some(path.clone())),
        None => AppConfig::load_default()?,
    };
    config.apply_env()?;
    if let Some(level) = &cli.log_level {
        config.daemon.log_level.clone_from(level);
    }
    Ok((config, source))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(config: &AppConfig, scheduled: bool) -> Result<()> {
    let job = build_job(config).wrap_err("failed to configure snapshot job")?;
    let trigger = if scheduled {
        Trigger::schedule()
    } else {
        Trigger::manual()
    };

    let response = job.handle(trigger).await;
    print_json(&response.payload)?;

    if !response.is_success() {
        bail!("snapshot run failed with status {}", response.status_code);
    }
    Ok(())
}

async fn collect(config: &AppConfig, project: Option<&str>) -> Result<()> {
    let project = project.unwrap_or(&config.snapshot.source_project);
    if project.trim().is_empty() {
        bail!("no project to list: pass --project or set snapshot.source_project");
    }

    let collector = build_collector(config).wrap_err("failed to configure instance listing")?;
    let collection = collector.collect(project).await;

    if let Some(e) = &collection.error {
        warn!(error = %e, "instance listing incomplete, output may be partial");
    }
    print_json(&collection.records)
}

/// `run` endpoint under the daemon base URL, keeping any base path
fn run_url(server: &Url) -> Result<Url> {
    vmsnap_gcp::endpoint_url(server, &["run"]).wrap_err("invalid server URL")
}

async fn trigger(server: &Url, timeout: Duration) -> Result<()> {
    let url = run_url(server)?;
    debug!(%url, "triggering snapshot");

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .post(url.clone())
        .send()
        .await
        .wrap_err_with(|| format!("failed to reach {url}"))?;

    let status = response.status();
    let payload: RunPayload = response
        .json()
        .await
        .wrap_err("daemon returned an unexpected body")?;
    print_json(&payload)?;

    if !status.is_success() {
        bail!("snapshot run failed with status {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let (config, source) = load_config(&cli)?;
    logging::init(&config.daemon.log_level, config.daemon.log_format)?;
    logging::config_source(source.as_deref());

    match &cli.command {
        Commands::Run { scheduled } => run(&config, *scheduled).await,
        Commands::Collect { project } => collect(&config, project.as_deref()).await,
        Commands::Trigger { server, timeout } => {
            trigger(server, Duration::from_secs(*timeout)).await
        }
    }
}
