//! Snapshot trigger endpoint

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use vmsnap_api::RunPayload;
use vmsnap_core::Trigger;

use crate::state::AppState;

/// Run one snapshot of the configured project
///
/// Answers 200 with either the no-instances message or the written records,
/// and 500 with `Internal error: ...` when the run failed.
#[utoipa::path(
    post,
    path = "/run",
    tag = "Snapshot",
    responses(
        (status = 200, description = "Snapshot written, or no instances found", body = RunPayload),
        (status = 500, description = "Run failed", body = RunPayload)
    )
)]
pub async fn run_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = state.job.handle(Trigger::http()).await;
    info!(
        status = response.status_code,
        rows = response.payload.instances().len(),
        dataset = %state.config.snapshot.dataset,
        "trigger handled"
    );

    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.payload))
}
