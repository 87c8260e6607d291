//! vmsnap daemon
//!
//! Serves the snapshot trigger over HTTP for schedulers and push subscriptions.

use std::sync::Arc;

use color_eyre::Result;
use eyre::WrapErr;
use tracing::info;
use vmsnap_core::{AppConfig, build_job, logging};

mod api;
mod router;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (mut config, source) = AppConfig::load_default()?;
    config.apply_env()?;
    logging::init(&config.daemon.log_level, config.daemon.log_format)?;
    logging::config_source(source.as_deref());

    let job = build_job(&config).wrap_err("failed to configure snapshot job")?;
    let bind = config.daemon.bind.clone();
    let app = router::create_router(Arc::new(AppState::new(job, config)));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "vmsnap daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("vmsnap daemon stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
