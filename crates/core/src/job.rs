//! Job records and the status state machine.
//!
//! A job moves strictly forward through `Uploaded → Processing →
//! Completed | Failed`. The transition methods on [`JobRecord`] are the
//! only way to change status; each rejects backward movement and
//! transitions out of a terminal state with `Conflict`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status permits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Full job record, owned by the registry.
///
/// `input_bytes` holds the uploaded image for the lifetime of the job.
/// `result_bytes` is set exactly once, on the transition into
/// `Completed`.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u32,
    pub total: u32,
    pub score: f64,
    pub input_bytes: Vec<u8>,
    pub result_bytes: Option<Vec<u8>>,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRecord {
    pub fn new(id: JobId, input_bytes: Vec<u8>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            status: JobStatus::Uploaded,
            progress: 0,
            total: 0,
            score: 0.0,
            input_bytes,
            result_bytes: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `Uploaded → Processing`, fixing the step total for the run.
    ///
    /// Any other starting status is rejected, which also guarantees at
    /// most one run per job: the second caller loses the compare-and-set.
    pub fn begin_processing(&mut self, total: u32) -> Result<(), CoreError> {
        if self.status != JobStatus::Uploaded {
            return Err(CoreError::Conflict(format!(
                "Job {} cannot start processing from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Processing;
        self.total = total;
        self.progress = 0;
        self.touch();
        Ok(())
    }

    /// Record one committed step. `progress` may never exceed `total`.
    pub fn record_step(&mut self, progress: u32, score: f64) -> Result<(), CoreError> {
        if self.status != JobStatus::Processing {
            return Err(CoreError::Conflict(format!(
                "Job {} is not processing (status {:?})",
                self.id, self.status
            )));
        }
        if progress > self.total {
            return Err(CoreError::Internal(format!(
                "Progress {progress} exceeds total {} for job {}",
                self.total, self.id
            )));
        }
        self.progress = progress;
        self.score = score;
        self.touch();
        Ok(())
    }

    /// `Processing → Completed`, storing the final artifact.
    pub fn complete(&mut self, result: Vec<u8>, score: f64) -> Result<(), CoreError> {
        if self.status != JobStatus::Processing {
            return Err(CoreError::Conflict(format!(
                "Job {} cannot complete from status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Completed;
        self.progress = self.total;
        self.score = score;
        self.result_bytes = Some(result);
        self.touch();
        Ok(())
    }

    /// Any non-terminal status → `Failed`, with a human-readable reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Job {} is already in terminal status {:?}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.touch();
        Ok(())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            status: self.status,
            progress: self.progress,
            total: self.total,
            score: self.score,
            error: self.failure_reason.clone(),
            has_result: self.result_bytes.is_some(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

/// Read model handed to HTTP handlers; carries no image bytes.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u32,
    pub total: u32,
    pub score: f64,
    pub error: Option<String>,
    pub has_result: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
