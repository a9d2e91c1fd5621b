//! Handler for `GET /api/download/{job_id}`.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use shapeflow_core::job::JobStatus;
use shapeflow_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/download/{job_id}
///
/// Serves the final JPEG once the job is `Completed`; 400 before that,
/// 404 for unknown ids.
pub async fn download_result(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.registry.snapshot(&job_id).await?;

    if snapshot.status != JobStatus::Completed {
        return Err(AppError::BadRequest("Job is not completed yet".into()));
    }

    let bytes = state
        .registry
        .result_bytes(&job_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Completed job has no result bytes".into()))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
