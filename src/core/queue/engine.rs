//! Job Queue Engine: five priority-ordered lanes, a bounded worker pool,
//! and retry-with-backoff. Each priority gets its own `Mutex`-guarded
//! `VecDeque`, polled by a `Semaphore`-bounded worker pool, so a worker
//! always pulls the head of the highest-priority non-empty lane rather than
//! scanning a single priority-sorted queue.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::{Mutex, Notify, Semaphore};

use super::job::{JobStore, QueueStats};
use super::retry::retry_delay;
use super::worker::{run_pipeline, JobContext};
use crate::core::conflict::{self, ConflictSeverity, Params};
use crate::core::events::{Event, EventBus};
use crate::core::types::{Job, JobPriority, JobState, JobType};
use crate::error::{SonarGateError, SonarGateResult};

/// Five `VecDeque` lanes, indexed by [`JobPriority`]'s ordinal (`Critical`
/// = 0 ... `Bulk` = 4). Within a lane, strict FIFO except retried jobs,
/// which re-enter at the front.
type Lanes = [VecDeque<String>; 5];

fn lane_index(priority: JobPriority) -> usize {
    priority as usize
}

/// Pop the head of the highest-priority non-empty lane. Pure and
/// independently testable from the async engine plumbing around it.
fn select_next(lanes: &mut Lanes) -> Option<String> {
    lanes.iter_mut().find_map(|lane| lane.pop_front())
}

struct EngineState {
    lanes: Lanes,
    cancel_flags: HashMap<String, Arc<AtomicBool>>,
    stats: QueueStats,
}

impl EngineState {
    fn new() -> Self {
        Self {
            lanes: Default::default(),
            cancel_flags: HashMap::new(),
            stats: QueueStats::default(),
        }
    }
}

/// The queue engine: owns the priority lanes and worker pool, delegates job
/// record storage to a [`JobStore`], and publishes every state/progress
/// change through an [`EventBus`].
pub struct QueueEngine {
    store: Arc<dyn JobStore>,
    events: Arc<EventBus>,
    state: Arc<Mutex<EngineState>>,
    semaphore: Arc<Semaphore>,
    notify: Arc<Notify>,
    retry_base_secs: u64,
}

impl QueueEngine {
    /// Construct an engine backed by `store`, publishing through `events`,
    /// with `pool_size` concurrent workers and the given retry base delay.
    pub fn new(store: Arc<dyn JobStore>, events: Arc<EventBus>, pool_size: usize, retry_base_secs: u64) -> Self {
        Self {
            store,
            events,
            state: Arc::new(Mutex::new(EngineState::new())),
            semaphore: Arc::new(Semaphore::new(pool_size.max(1))),
            notify: Arc::new(Notify::new()),
            retry_base_secs,
        }
    }

    /// Enqueue `job` (already `QUEUED`) onto its priority lane. A `PROCESS`
    /// job carrying a `proposedParams` object in its `data` is refused
    /// outright if those parameters contain a BLOCKING conflict — the
    /// caller never gets a job id back, and the conflict is surfaced as an
    /// error instead of silently entering the queue.
    pub async fn enqueue(&self, job: Job) -> SonarGateResult<String> {
        if job.job_type == JobType::Process {
            reject_blocking_conflicts(&job)?;
        }
        let id = job.id.clone();
        let lane = lane_index(job.priority);
        self.store.insert(job).await?;
        {
            let mut state = self.state.lock().await;
            state.cancel_flags.insert(id.clone(), Arc::new(AtomicBool::new(false)));
            state.lanes[lane].push_back(id.clone());
        }
        self.notify.notify_one();
        Ok(id)
    }

    /// `cancel(id)`: `true` iff the job was `QUEUED` or `RUNNING`. A `QUEUED` job is removed from its lane synchronously; a
    /// `RUNNING` job has its cancellation flag flipped for the worker to
    /// observe at its next checkpoint.
    pub async fn cancel(&self, id: &str) -> SonarGateResult<bool> {
        let Some(mut job) = self.store.get(id).await? else {
            return Ok(false);
        };
        match job.state {
            JobState::Queued => {
                let mut state = self.state.lock().await;
                for lane in state.lanes.iter_mut() {
                    lane.retain(|j| j != id);
                }
                job.state = JobState::Cancelled;
                job.updated_at = SystemTime::now();
                drop(state);
                self.store.update(job).await?;
                self.publish(id, None, Some(JobState::Cancelled)).await;
                Ok(true)
            }
            JobState::Running => {
                let state = self.state.lock().await;
                if let Some(flag) = state.cancel_flags.get(id) {
                    flag.store(true, Ordering::SeqCst);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => Ok(false),
        }
    }

    /// Fetch a job's current record.
    pub async fn get_job(&self, id: &str) -> SonarGateResult<Option<Job>> {
        self.store.get(id).await
    }

    /// List every tracked job.
    pub async fn list_jobs(&self) -> SonarGateResult<Vec<Job>> {
        self.store.list().await
    }

    /// Snapshot of running statistics.
    pub async fn stats(&self) -> QueueStats {
        self.state.lock().await.stats.clone()
    }

    async fn publish(&self, job_id: &str, progress: Option<crate::core::types::Progress>, state: Option<JobState>) {
        self.events.publish(Event {
            job_id: job_id.to_string(),
            project_id: None,
            state,
            progress,
            timestamp: SystemTime::now(),
        });
    }

    /// Spawn the worker pool. Each worker loops: acquire a permit, pull the
    /// next job (waiting on `Notify` when every lane is empty), run its
    /// pipeline, report the terminal transition — including, for a failed
    /// job with attempts remaining, sleeping out its own backoff before
    /// looping again.
    pub fn spawn_workers(self: &Arc<Self>, pool_size: usize) {
        for _ in 0..pool_size.max(1) {
            let engine = Arc::clone(self);
            tokio::spawn(async move { engine.worker_loop().await });
        }
    }

    async fn next_job_id(&self) -> String {
        loop {
            {
                let mut state = self.state.lock().await;
                if let Some(id) = select_next(&mut state.lanes) {
                    return id;
                }
            }
            self.notify.notified().await;
        }
    }

    async fn worker_loop(self: Arc<Self>) {
        loop {
            let _permit = self.semaphore.clone().acquire_owned().await.unwrap();
            let id = self.next_job_id().await;
            self.run_one(&id).await;
        }
    }

    async fn run_one(&self, id: &str) {
        let Ok(Some(mut job)) = self.store.get(id).await else { return };
        job.state = JobState::Running;
        job.attempts += 1;
        job.updated_at = SystemTime::now();
        let _ = self.store.update(job.clone()).await;
        self.publish(id, None, Some(JobState::Running)).await;

        let cancel_flag = {
            let state = self.state.lock().await;
            state.cancel_flags.get(id).cloned().unwrap_or_default()
        };

        let events = Arc::clone(&self.events);
        let job_id = id.to_string();
        let ctx = JobContext::new(job_id.clone(), cancel_flag, move |phase, fraction, message| {
            if let Some(percent) = crate::core::events::phase_percent(phase, fraction) {
                events.publish(Event {
                    job_id: job_id.clone(),
                    project_id: None,
                    state: None,
                    progress: Some(crate::core::types::Progress {
                        phase: phase.to_string(),
                        percent,
                        message: message.to_string(),
                    }),
                    timestamp: SystemTime::now(),
                });
            }
        });

        let started = std::time::Instant::now();
        let outcome = run_pipeline(&job, &ctx).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(result) => {
                job.state = JobState::Completed;
                job.result = Some(result);
                job.error = None;
                job.updated_at = SystemTime::now();
                let _ = self.store.update(job).await;
                self.state.lock().await.stats.record_terminal(true, elapsed_ms);
                self.publish(id, None, Some(JobState::Completed)).await;
            }
            Err(err) => {
                let is_cancel = err.is_cancellation();
                if is_cancel {
                    job.state = JobState::Cancelled;
                    job.error = Some(err.to_string());
                    job.updated_at = SystemTime::now();
                    let _ = self.store.update(job).await;
                    self.publish(id, None, Some(JobState::Cancelled)).await;
                    return;
                }

                if job.attempts < job.max_attempts {
                    job.state = JobState::Retrying;
                    job.error = Some(err.to_string());
                    job.updated_at = SystemTime::now();
                    let _ = self.store.update(job.clone()).await;
                    self.state.lock().await.stats.record_retry();
                    self.publish(id, None, Some(JobState::Retrying)).await;

                    let delay = retry_delay(self.retry_base_secs, job.attempts);
                    tokio::time::sleep(delay).await;

                    job.state = JobState::Queued;
                    job.updated_at = SystemTime::now();
                    let _ = self.store.update(job.clone()).await;
                    {
                        let mut state = self.state.lock().await;
                        state.lanes[lane_index(job.priority)].push_front(job.id.clone());
                    }
                    self.notify.notify_one();
                    self.publish(id, None, Some(JobState::Queued)).await;
                } else {
                    job.state = JobState::Failed;
                    job.error = Some(err.to_string());
                    job.updated_at = SystemTime::now();
                    let _ = self.store.update(job).await;
                    self.state.lock().await.stats.record_terminal(false, elapsed_ms);
                    self.publish(id, None, Some(JobState::Failed)).await;
                }
            }
        }
    }
}

impl SonarGateError {
    fn is_cancellation(&self) -> bool {
        matches!(self, SonarGateError::Job { message, .. } if message == "cancelled")
    }
}

/// Refuse `job` if its `data.proposedParams` object contains a BLOCKING
/// conflict. A `PROCESS` job with no `proposedParams` (or a non-object
/// value there) has nothing to gate and is left alone.
fn reject_blocking_conflicts(job: &Job) -> SonarGateResult<()> {
    let Some(object) = job.data.get("proposedParams").and_then(|v| v.as_object()) else {
        return Ok(());
    };
    let params: Params = object.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let result = conflict::validate_parameters(&params);
    if let Some(blocking) = result.conflicts.iter().find(|c| c.severity == ConflictSeverity::Blocking) {
        return Err(SonarGateError::conflict(
            blocking.rule_id.clone(),
            format!("refusing to enqueue PROCESS job: {}", blocking.name),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_next_always_prefers_critical_over_low() {
        let mut lanes: Lanes = Default::default();
        lanes[lane_index(JobPriority::Low)].push_back("j1".to_string());
        lanes[lane_index(JobPriority::Critical)].push_back("j2".to_string());
        assert_eq!(select_next(&mut lanes), Some("j2".to_string()));
        assert_eq!(select_next(&mut lanes), Some("j1".to_string()));
        assert_eq!(select_next(&mut lanes), None);
    }

    #[test]
    fn fifo_within_a_single_lane() {
        let mut lanes: Lanes = Default::default();
        lanes[lane_index(JobPriority::Normal)].push_back("a".to_string());
        lanes[lane_index(JobPriority::Normal)].push_back("b".to_string());
        assert_eq!(select_next(&mut lanes), Some("a".to_string()));
        assert_eq!(select_next(&mut lanes), Some("b".to_string()));
    }

    #[test]
    fn retried_job_requeues_at_the_front_of_its_lane() {
        let mut lanes: Lanes = Default::default();
        lanes[lane_index(JobPriority::Normal)].push_back("existing".to_string());
        lanes[lane_index(JobPriority::Normal)].push_front("retried".to_string());
        assert_eq!(select_next(&mut lanes), Some("retried".to_string()));
    }

    fn process_job(proposed_params: serde_json::Value) -> Job {
        Job {
            id: "p1".to_string(),
            job_type: JobType::Process,
            priority: JobPriority::High,
            state: JobState::Queued,
            data: serde_json::json!({ "proposedParams": proposed_params }),
            config: serde_json::json!({}),
            attempts: 0,
            max_attempts: 3,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
            progress: Default::default(),
            result: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn enqueue_refuses_process_job_with_blocking_conflict() {
        let engine = QueueEngine::new(
            Arc::new(super::super::job::InMemoryJobStore::new()),
            Arc::new(EventBus::new()),
            2,
            5,
        );
        let job = process_job(serde_json::json!({ "eqBoostMax": 13.0 }));
        assert!(engine.enqueue(job).await.is_err());
    }

    #[tokio::test]
    async fn enqueue_accepts_process_job_with_clean_params() {
        let engine = QueueEngine::new(
            Arc::new(super::super::job::InMemoryJobStore::new()),
            Arc::new(EventBus::new()),
            2,
            5,
        );
        let job = process_job(serde_json::json!({ "eqBoostMax": 2.0 }));
        assert!(engine.enqueue(job).await.is_ok());
    }

    #[tokio::test]
    async fn enqueue_accepts_process_job_with_no_proposed_params() {
        let engine = QueueEngine::new(
            Arc::new(super::super::job::InMemoryJobStore::new()),
            Arc::new(EventBus::new()),
            2,
            5,
        );
        let job = Job {
            id: "p2".to_string(),
            job_type: JobType::Process,
            priority: JobPriority::High,
            state: JobState::Queued,
            data: serde_json::json!({ "platform": "spotify" }),
            config: serde_json::json!({}),
            attempts: 0,
            max_attempts: 3,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
            progress: Default::default(),
            result: None,
            error: None,
        };
        assert!(engine.enqueue(job).await.is_ok());
    }
}
