//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};
use vmsnap_api::{HealthResponse, InstanceRecord, RunPayload, SnapshotResponse};

use crate::api::{run, system};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vmsnap API",
        description = "Compute Engine fleet snapshots into BigQuery",
    ),
    paths(run::run_snapshot, system::health),
    components(schemas(RunPayload, SnapshotResponse, InstanceRecord, HealthResponse)),
    tags(
        (name = "Snapshot", description = "Trigger a fleet snapshot"),
        (name = "System", description = "Daemon health")
    )
)]
pub struct ApiDoc;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Trigger endpoints; `/` serves push-style schedulers
        .route("/", post(run::run_snapshot))
        .route("/run", post(run::run_snapshot))
        // System endpoints
        .route("/health", get(system::health))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}
