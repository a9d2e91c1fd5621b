//! Handler for `GET /api/status/{job_id}`.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use shapeflow_core::job::JobStatus;
use shapeflow_core::types::JobId;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: JobStatus,
    pub progress: u32,
    pub total: u32,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed: bool,
}

/// GET /api/status/{job_id}
///
/// Synchronous snapshot of one job. 404 for ids this process has never
/// issued; records are process-scoped, so an id from before a restart
/// is simply unknown.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<Json<StatusResponse>> {
    let snapshot = state.registry.snapshot(&job_id).await?;

    Ok(Json(StatusResponse {
        status: snapshot.status,
        progress: snapshot.progress,
        total: snapshot.total,
        score: snapshot.score,
        error: snapshot.error,
        completed: snapshot.status == JobStatus::Completed,
    }))
}
