//! Integration tests for the job lifecycle endpoints.
//!
//! Each test drives the full production router (all middleware layers)
//! via `tower::ServiceExt::oneshot`. Runs execute on the real
//! hill-climbing optimizer against small solid-color inputs, so they
//! finish quickly.

mod common;

use std::time::Duration;

use axum::extract::ws::Message;
use axum::http::StatusCode;
use common::{body_bytes, body_json, build_test_app, get, png_bytes, post_json, post_multipart};
use serde_json::json;
use shapeflow_core::job_events::ProgressFrame;

/// Poll the status endpoint until the given predicate holds or the
/// timeout elapses.
async fn wait_for_status(
    state: &shapeflow_api::state::AppState,
    job_id: &str,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    loop {
        let app = build_test_app(state.clone());
        let response = get(app, &format!("/api/status/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        if predicate(&status) {
            return status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timed out waiting for status; last seen: {status}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Receive frames from a hub subscription until a terminal frame
/// (`completed == true`) arrives.
async fn collect_frames_until_terminal(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<Message>,
) -> Vec<ProgressFrame> {
    let mut frames = Vec::new();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("Timed out waiting for a progress frame")
            .expect("Hub channel closed before the terminal frame");
        if let Message::Text(text) = msg {
            let frame: ProgressFrame = serde_json::from_str(&text).unwrap();
            let done = frame.completed;
            frames.push(frame);
            if done {
                return frames;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test: full lifecycle: upload, process, frames, status, download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_lifecycle_produces_frames_and_artifact() {
    let state = common::test_state();

    // Subscribe before anything runs so every frame is observed.
    let mut rx = state.hub.subscribe("test-observer".to_string()).await;

    // Upload a 512x512 opaque red PNG.
    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        &png_bytes(512, 512, [255, 0, 0, 255]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let job_id = body_json(response).await["jobId"]
        .as_str()
        .expect("upload response must carry jobId")
        .to_string();

    // Start a 10-triangle run.
    let response = post_json(
        build_test_app(state.clone()),
        "/api/process",
        json!({ "jobId": job_id, "count": 10, "mode": 1, "alpha": 128 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let process = body_json(response).await;
    assert_eq!(process["jobId"], job_id);
    assert!(
        !process["initialImage"].as_str().unwrap().is_empty(),
        "process response must carry the background preview"
    );

    // Status eventually reports completion.
    let status = wait_for_status(&state, &job_id, |s| s["completed"] == true).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 10);
    assert_eq!(status["total"], 10);

    // Frames: strictly increasing progress, sampled cadence, terminal
    // frame with a populated preview.
    let frames = collect_frames_until_terminal(&mut rx).await;
    let for_job: Vec<&ProgressFrame> = frames
        .iter()
        .filter(|f| f.job_id.to_string() == job_id)
        .collect();
    assert!(!for_job.is_empty());

    let progress_values: Vec<u32> = for_job.iter().map(|f| f.progress).collect();
    assert!(
        progress_values.windows(2).all(|w| w[0] < w[1] || (w[0] == w[1] && w[0] == 10)),
        "Progress must not decrease across frames: {progress_values:?}"
    );
    assert!(progress_values[0] <= 5);
    assert_eq!(*progress_values.last().unwrap(), 10);

    let terminal = for_job.last().unwrap();
    assert!(terminal.completed);
    assert!(terminal.error.is_none());
    assert!(
        terminal.image_data.as_deref().is_some_and(|d| !d.is_empty()),
        "Terminal frame must carry the final preview"
    );

    // Scores never rise across frames.
    let scores: Vec<f64> = for_job.iter().map(|f| f.score).collect();
    assert!(
        scores.windows(2).all(|w| w[1] <= w[0]),
        "Scores must be non-increasing: {scores:?}"
    );

    // Download the artifact: raw JPEG bytes.
    let response = get(build_test_app(state.clone()), &format!("/api/download/{job_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    let artifact = body_bytes(response).await;
    assert!(!artifact.is_empty());
    let decoded = image::load_from_memory(&artifact).expect("artifact must be a decodable image");
    assert_eq!(decoded.width(), 256);
}

// ---------------------------------------------------------------------------
// Test: invalid parameters are rejected before any state changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn negative_count_rejected_without_side_effects() {
    let state = common::test_state();
    let mut rx = state.hub.subscribe("test-observer".to_string()).await;

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        &png_bytes(32, 32, [0, 255, 0, 255]),
    )
    .await;
    let job_id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    let response = post_json(
        build_test_app(state.clone()),
        "/api/process",
        json!({ "jobId": job_id, "count": -1, "mode": 1, "alpha": 128 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    // The job is untouched and no frame was emitted.
    let status = body_json(
        get(build_test_app(state.clone()), &format!("/api/status/{job_id}")).await,
    )
    .await;
    assert_eq!(status["status"], "uploaded");
    assert_eq!(status["progress"], 0);
    assert!(rx.try_recv().is_err(), "No frame may be emitted for a rejected run");
}

#[tokio::test]
async fn out_of_range_mode_and_alpha_rejected() {
    let state = common::test_state();

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        &png_bytes(32, 32, [0, 0, 255, 255]),
    )
    .await;
    let job_id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    for body in [
        json!({ "jobId": job_id, "count": 10, "mode": 9, "alpha": 128 }),
        json!({ "jobId": job_id, "count": 10, "mode": 1, "alpha": 300 }),
        json!({ "jobId": job_id, "count": 100000, "mode": 1, "alpha": 128 }),
    ] {
        let response = post_json(build_test_app(state.clone()), "/api/process", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// ---------------------------------------------------------------------------
// Test: unknown job ids yield 404 everywhere
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let state = common::test_state();
    let bogus = uuid::Uuid::new_v4();

    let response = get(build_test_app(state.clone()), &format!("/api/status/{bogus}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = get(
        build_test_app(state.clone()),
        &format!("/api/download/{bogus}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(
        build_test_app(state.clone()),
        "/api/process",
        json!({ "jobId": bogus, "count": 10, "mode": 1, "alpha": 128 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: uploads that are not images are rejected before job creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn garbage_upload_rejected() {
    let state = common::test_state();

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        b"this is not an image at all",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.registry.job_count().await, 0);
}

#[tokio::test]
async fn upload_without_file_field_rejected() {
    let state = common::test_state();

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "attachment",
        &png_bytes(16, 16, [1, 2, 3, 255]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.registry.job_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: download before completion is a client error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_before_completion_rejected() {
    let state = common::test_state();

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        &png_bytes(32, 32, [9, 9, 9, 255]),
    )
    .await;
    let job_id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    let response = get(
        build_test_app(state.clone()),
        &format!("/api/download/{job_id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: a second start-run request loses the compare-and-set
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_process_request_conflicts() {
    let state = common::test_state();

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        &png_bytes(64, 64, [128, 0, 255, 255]),
    )
    .await;
    let job_id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    let body = json!({ "jobId": job_id, "count": 5, "mode": 2, "alpha": 200 });
    let response = post_json(build_test_app(state.clone()), "/api/process", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(build_test_app(state.clone()), "/api/process", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The first run still completes normally.
    let status = wait_for_status(&state, &job_id, |s| s["completed"] == true).await;
    assert_eq!(status["status"], "completed");
}

// ---------------------------------------------------------------------------
// Test: an observer joining after completion sees no past frames
// ---------------------------------------------------------------------------

#[tokio::test]
async fn late_observer_receives_no_replayed_frames() {
    let state = common::test_state();

    let response = post_multipart(
        build_test_app(state.clone()),
        "/api/upload",
        "file",
        &png_bytes(32, 32, [255, 255, 0, 255]),
    )
    .await;
    let job_id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    let response = post_json(
        build_test_app(state.clone()),
        "/api/process",
        json!({ "jobId": job_id, "count": 3, "mode": 4, "alpha": 128 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    wait_for_status(&state, &job_id, |s| s["completed"] == true).await;

    let mut rx = state.hub.subscribe("late-observer".to_string()).await;
    assert!(
        rx.try_recv().is_err(),
        "Frames from an already-finished run must not be replayed"
    );
}

// ---------------------------------------------------------------------------
// Test: health endpoint and general HTTP behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let state = common::test_state();
    let response = get(build_test_app(state), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let state = common::test_state();
    let response = get(build_test_app(state), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let state = common::test_state();
    let response = get(build_test_app(state), "/health").await;

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );
}
