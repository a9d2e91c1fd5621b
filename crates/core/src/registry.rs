//! In-memory job store.
//!
//! One `Arc<RwLock<JobRecord>>` per job under an outer map lock: lookups
//! briefly take the map lock, mutation takes only the entry's own lock,
//! so runs for unrelated jobs never contend. Critical sections are plain
//! field reads and writes; step and encode work never happens under a
//! lock. Records live until the process exits (no eviction).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::job::{JobRecord, JobSnapshot};
use crate::types::JobId;

type Entry = Arc<RwLock<JobRecord>>;

/// Concurrent job store; the single source of truth for job state.
///
/// Designed to be wrapped in `Arc` and shared between HTTP handlers and
/// in-flight run tasks.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Entry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Store uploaded bytes under a fresh job id; the job starts in
    /// `Uploaded`.
    pub async fn create(&self, input_bytes: Vec<u8>) -> JobId {
        let id = uuid::Uuid::new_v4();
        let record = JobRecord::new(id, input_bytes);
        self.jobs
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(record)));
        id
    }

    /// Point-in-time snapshot of one job.
    pub async fn snapshot(&self, id: &JobId) -> Result<JobSnapshot, CoreError> {
        let entry = self.entry(id).await?;
        let record = entry.read().await;
        Ok(record.snapshot())
    }

    /// Apply a mutation to one job, atomically with respect to other
    /// readers and writers of the same job.
    pub async fn update<T>(
        &self,
        id: &JobId,
        mutate: impl FnOnce(&mut JobRecord) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let entry = self.entry(id).await?;
        let mut record = entry.write().await;
        mutate(&mut record)
    }

    /// Clone of the uploaded bytes (one clone per run start).
    pub async fn input_bytes(&self, id: &JobId) -> Result<Vec<u8>, CoreError> {
        let entry = self.entry(id).await?;
        let record = entry.read().await;
        Ok(record.input_bytes.clone())
    }

    /// Clone of the final artifact, or `None` while the job is
    /// unfinished.
    pub async fn result_bytes(&self, id: &JobId) -> Result<Option<Vec<u8>>, CoreError> {
        let entry = self.entry(id).await?;
        let record = entry.read().await;
        Ok(record.result_bytes.clone())
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    async fn entry(&self, id: &JobId) -> Result<Entry, CoreError> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "Job",
                id: *id,
            })
    }
}
