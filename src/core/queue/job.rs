//! Job persistence boundary: the engine treats job storage as an external
//! collaborator through the [`JobStore`] trait rather than owning storage
//! itself. [`InMemoryJobStore`] is the standalone/test implementation; a
//! real deployment supplies its own.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::types::Job;
use crate::error::{SonarGateError, SonarGateResult};

/// CRUD boundary for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a newly-created job. Errors if `job.id` already exists.
    async fn insert(&self, job: Job) -> SonarGateResult<()>;
    /// Overwrite an existing job record. Errors if `job.id` is unknown.
    async fn update(&self, job: Job) -> SonarGateResult<()>;
    /// Fetch a job by id.
    async fn get(&self, id: &str) -> SonarGateResult<Option<Job>>;
    /// List every job currently tracked.
    async fn list(&self) -> SonarGateResult<Vec<Job>>;
}

/// `HashMap`-backed [`JobStore`] for standalone use and tests.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> SonarGateResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(SonarGateError::job(job.id.clone(), "job id already exists"));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn update(&self, job: Job) -> SonarGateResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(SonarGateError::job(job.id.clone(), "unknown job id"));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &str) -> SonarGateResult<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> SonarGateResult<Vec<Job>> {
        Ok(self.jobs.lock().unwrap().values().cloned().collect())
    }
}

/// Running totals updated at terminal job transitions.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    /// Jobs that reached `COMPLETED`.
    pub processed: u64,
    /// Jobs that reached `FAILED` (retries exhausted or non-retryable).
    pub failed: u64,
    /// Total number of `RETRYING` transitions across all jobs.
    pub retries: u64,
    /// Running average processing time in milliseconds, updated with each
    /// terminal (`COMPLETED`/`FAILED`) transition via the incremental-mean
    /// formula `avg' = avg + (sample - avg) / n`, where `n` is the count of
    /// terminal transitions observed so far (including this one).
    pub avg_processing_time_ms: f64,
    terminal_count: u64,
}

impl QueueStats {
    /// Fold one terminal transition's processing time into the running
    /// average and bump the relevant counter.
    pub fn record_terminal(&mut self, succeeded: bool, processing_time_ms: f64) {
        self.terminal_count += 1;
        self.avg_processing_time_ms +=
            (processing_time_ms - self.avg_processing_time_ms) / self.terminal_count as f64;
        if succeeded {
            self.processed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Bump the retry counter; does not affect the processing-time average.
    pub fn record_retry(&mut self) {
        self.retries += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemoryJobStore::new();
        let job = crate::core::types::Job {
            id: "j1".to_string(),
            job_type: crate::core::types::JobType::Analyze,
            priority: crate::core::types::JobPriority::Normal,
            state: crate::core::types::JobState::Queued,
            data: serde_json::json!({}),
            config: serde_json::json!({}),
            attempts: 0,
            max_attempts: 3,
            created_at: std::time::SystemTime::now(),
            updated_at: std::time::SystemTime::now(),
            progress: Default::default(),
            result: None,
            error: None,
        };
        store.insert(job.clone()).await.unwrap();
        let fetched = store.get("j1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "j1");
    }

    #[tokio::test]
    async fn insert_duplicate_id_errors() {
        let store = InMemoryJobStore::new();
        let job = crate::core::types::Job {
            id: "j1".to_string(),
            job_type: crate::core::types::JobType::Analyze,
            priority: crate::core::types::JobPriority::Normal,
            state: crate::core::types::JobState::Queued,
            data: serde_json::json!({}),
            config: serde_json::json!({}),
            attempts: 0,
            max_attempts: 3,
            created_at: std::time::SystemTime::now(),
            updated_at: std::time::SystemTime::now(),
            progress: Default::default(),
            result: None,
            error: None,
        };
        store.insert(job.clone()).await.unwrap();
        assert!(store.insert(job).await.is_err());
    }

    #[test]
    fn incremental_average_matches_plain_mean_of_three_samples() {
        let mut stats = QueueStats::default();
        stats.record_terminal(true, 100.0);
        stats.record_terminal(true, 200.0);
        stats.record_terminal(false, 300.0);
        assert!((stats.avg_processing_time_ms - 200.0).abs() < 1e-9);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
    }
}
