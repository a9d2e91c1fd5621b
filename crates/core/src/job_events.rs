//! Broadcast frames describing run progress.
//!
//! One frame per broadcast event, serialized as a self-contained JSON
//! object. Frames are not scoped per job: every observer receives every
//! job's frames and filters by `jobId` client-side.

use serde::{Deserialize, Serialize};

use crate::types::JobId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFrame {
    pub job_id: JobId,
    pub progress: u32,
    pub total: u32,
    pub score: f64,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Base64-encoded JPEG preview of the current canvas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl ProgressFrame {
    /// A sampled mid-run frame. `image_data` is present on sampled steps
    /// and absent otherwise.
    pub fn progress(
        job_id: JobId,
        progress: u32,
        total: u32,
        score: f64,
        image_data: Option<String>,
    ) -> Self {
        Self {
            job_id,
            progress,
            total,
            score,
            completed: false,
            error: None,
            image_data,
        }
    }

    /// The terminal frame of a successful run, carrying the final
    /// preview so observers can switch UI state without a second fetch.
    pub fn completion(job_id: JobId, total: u32, score: f64, image_data: String) -> Self {
        Self {
            job_id,
            progress: total,
            total,
            score,
            completed: true,
            error: None,
            image_data: Some(image_data),
        }
    }

    /// The terminal frame of a failed run.
    pub fn failure(job_id: JobId, reason: impl Into<String>) -> Self {
        Self {
            job_id,
            progress: 0,
            total: 0,
            score: 0.0,
            completed: true,
            error: Some(reason.into()),
            image_data: None,
        }
    }
}
