//! Route definitions for the job lifecycle endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{download, process, status, upload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload::upload_image))
        .route("/process", post(process::start_processing))
        .route("/status/{job_id}", get(status::job_status))
        .route("/download/{job_id}", get(download::download_result))
}
