//! Handler for `POST /api/upload`.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use shapeflow_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: JobId,
}

/// POST /api/upload
///
/// Accepts a multipart body with a `file` field containing the image.
/// The bytes are format-sniffed before a job is created, so garbage or
/// unsupported uploads never leave a record behind. The full decode
/// happens when processing starts.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file_data = Some(data.to_vec());
            }
            _ => {} // ignore unknown fields
        }
    }

    let data =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    // Header-only sniff.
    image::guess_format(&data)
        .map_err(|_| AppError::BadRequest("Unsupported or unrecognized image format".into()))?;

    let job_id = state.registry.create(data).await;
    tracing::info!(%job_id, "Image uploaded");

    Ok(Json(UploadResponse { job_id }))
}
