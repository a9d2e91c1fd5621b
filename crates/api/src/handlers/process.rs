//! Handler for `POST /api/process`.

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use shapeflow_core::params::ProcessParams;
use shapeflow_core::types::JobId;
use shapeflow_pipeline::{canvas, Model, PipelineError};

use crate::engine::runner;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// JPEG quality for the immediately-returned background preview.
const INITIAL_PREVIEW_QUALITY: u8 = 70;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub job_id: JobId,
    pub count: i64,
    pub mode: i64,
    pub alpha: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub job_id: JobId,
    /// Base64 JPEG of the bare background, so the caller can render
    /// before the first sampled frame arrives.
    pub initial_image: String,
}

/// POST /api/process
///
/// Validates parameters, renders the bare-background preview, moves the
/// job into `Processing`, and dispatches the run. Returns as soon as
/// the run is spawned; progress is observable via `/api/status/{jobId}`
/// and `/ws`.
///
/// Decode failures surface here as 400 and leave the job in `Uploaded`;
/// a job already processing (or finished) yields 409.
pub async fn start_processing(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> AppResult<Json<ProcessResponse>> {
    let params = ProcessParams::validate(req.count, req.mode, req.alpha)?;

    let input = state.registry.input_bytes(&req.job_id).await?;

    let initial_image =
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PipelineError> {
            let prepared = canvas::prepare(&input)?;
            let model = Model::new(prepared.target, prepared.background);
            canvas::encode_jpeg(model.current(), INITIAL_PREVIEW_QUALITY)
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Preview task failed: {e}")))??;

    state
        .registry
        .update(&req.job_id, |job| job.begin_processing(params.count))
        .await?;

    runner::spawn_run(&state, req.job_id, params);

    tracing::info!(
        job_id = %req.job_id,
        count = params.count,
        kind = ?params.kind,
        alpha = params.alpha,
        "Run dispatched",
    );

    Ok(Json(ProcessResponse {
        job_id: req.job_id,
        initial_image: BASE64.encode(initial_image),
    }))
}
