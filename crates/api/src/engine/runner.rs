//! The approximation driver.
//!
//! One call to [`spawn_run`] owns the whole lifecycle of a run:
//! prepare, N strictly sequential optimizer steps, sampled preview
//! frames, final artifact, terminal frame. Every fault (decode or
//! encode failure, or a panic inside a step) is caught at the run
//! boundary and converted into the job's `Failed` state plus a terminal
//! error frame; a run can never take the serving process down, and a
//! failed run never retries.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use shapeflow_core::error::CoreError;
use shapeflow_core::job_events::ProgressFrame;
use shapeflow_core::params::ProcessParams;
use shapeflow_core::registry::JobRegistry;
use shapeflow_core::types::JobId;
use shapeflow_pipeline::{canvas, Model, PipelineError, ShapeOptimizer};

use crate::state::AppState;
use crate::ws::ProgressHub;

/// Emit a preview frame every this many steps (and on the final step).
/// Encoding dominates step latency at working size, so frames are
/// sampled rather than emitted per step.
const SAMPLE_INTERVAL: u32 = 5;
/// JPEG quality for intermediate previews.
const PREVIEW_QUALITY: u8 = 70;
/// JPEG quality for the stored final artifact.
const FINAL_QUALITY: u8 = 90;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Registry(#[from] CoreError),

    #[error("Shape fitting panicked: {0}")]
    StepPanic(String),
}

/// Dispatch a run for `job_id` on an independent task and return
/// immediately. The job must already be in `Processing` (the caller
/// holds the winning compare-and-set).
pub fn spawn_run(state: &AppState, job_id: JobId, params: ProcessParams) {
    let registry = Arc::clone(&state.registry);
    let hub = Arc::clone(&state.hub);
    let optimizer = Arc::clone(&state.optimizer);

    tokio::spawn(async move {
        if let Err(err) = run(&registry, &hub, optimizer, job_id, params).await {
            let reason = err.to_string();
            tracing::error!(%job_id, error = %reason, "Run failed");
            if let Err(e) = registry.update(&job_id, |job| job.fail(reason.clone())).await {
                tracing::error!(%job_id, error = %e, "Failed to record run failure");
            }
            hub.publish(&ProgressFrame::failure(job_id, reason)).await;
        }
    });
}

async fn run(
    registry: &JobRegistry,
    hub: &ProgressHub,
    optimizer: Arc<dyn ShapeOptimizer>,
    job_id: JobId,
    params: ProcessParams,
) -> Result<(), RunError> {
    let input = registry.input_bytes(&job_id).await?;

    // Decode and downscale off the async runtime; every heavy stage of
    // the run goes through spawn_blocking the same way.
    let prepared = tokio::task::spawn_blocking(move || canvas::prepare(&input))
        .await
        .map_err(join_error_reason)??;
    let mut model = Model::new(prepared.target, prepared.background);

    let initial_score = model.score();
    registry
        .update(&job_id, |job| job.record_step(0, initial_score))
        .await?;

    // Pre-loop frame: the bare background, so observers have something
    // to render before the first shape lands.
    let preview = encode_preview(&model).await?;
    hub.publish(&ProgressFrame::progress(
        job_id,
        0,
        params.count,
        initial_score,
        Some(preview),
    ))
    .await;

    for i in 1..=params.count {
        // Each step depends on the canvas committed by the previous one;
        // the loop is sequential by construction.
        let step_optimizer = Arc::clone(&optimizer);
        let step_model = model;
        let (stepped, score) = tokio::task::spawn_blocking(move || {
            let mut model = step_model;
            let score = step_optimizer.step(&mut model, params.kind, params.alpha);
            (model, score)
        })
        .await
        .map_err(join_error_reason)?;
        model = stepped;

        registry
            .update(&job_id, |job| job.record_step(i, score))
            .await?;

        if i % SAMPLE_INTERVAL == 0 || i == params.count {
            let preview = encode_preview(&model).await?;
            hub.publish(&ProgressFrame::progress(
                job_id,
                i,
                params.count,
                score,
                Some(preview),
            ))
            .await;
        }
    }

    // Final artifact at full quality.
    let final_model = model;
    let (artifact, score) = tokio::task::spawn_blocking(move || {
        let bytes = canvas::encode_jpeg(final_model.current(), FINAL_QUALITY);
        (bytes, final_model.score())
    })
    .await
    .map_err(join_error_reason)?;
    let artifact = artifact?;

    let encoded = BASE64.encode(&artifact);
    registry
        .update(&job_id, move |job| job.complete(artifact, score))
        .await?;
    hub.publish(&ProgressFrame::completion(job_id, params.count, score, encoded))
        .await;

    tracing::info!(%job_id, shapes = params.count, score, "Run completed");
    Ok(())
}

/// Encode the current canvas as a base64 JPEG preview, off the async
/// runtime.
async fn encode_preview(model: &Model) -> Result<String, RunError> {
    let snapshot = model.current().clone();
    let bytes = tokio::task::spawn_blocking(move || canvas::encode_jpeg(&snapshot, PREVIEW_QUALITY))
        .await
        .map_err(join_error_reason)??;
    Ok(BASE64.encode(bytes))
}

/// A panicking blocking task surfaces here; the payload becomes the
/// failure reason.
fn join_error_reason(err: tokio::task::JoinError) -> RunError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        RunError::StepPanic(message)
    } else {
        RunError::StepPanic("background task cancelled".to_string())
    }
}
