//! Event Bus: in-process, synchronous publish-subscribe over
//! three topic families — `job:<id>`, `project:<id>`, `jobs:all` — backed by
//! one `tokio::sync::broadcast` channel per topic, created lazily on first
//! publish or subscribe. Every job state change or progress update is
//! published to `jobs:all` and, when applicable, to its `job:<id>` and
//! `project:<id>` topics, preserving per-job event order.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use tokio::sync::broadcast;

use crate::core::types::{JobState, Progress};

/// Topic capacity: how many past events a late subscriber can still catch
/// via `broadcast::Receiver::recv` lag detection before being dropped.
const TOPIC_CAPACITY: usize = 256;

/// Global topic name carrying every event regardless of job or project.
pub const JOBS_ALL_TOPIC: &str = "jobs:all";

/// Build the per-job topic name.
pub fn job_topic(job_id: &str) -> String {
    format!("job:{job_id}")
}

/// Build the per-project topic name.
pub fn project_topic(project_id: &str) -> String {
    format!("project:{project_id}")
}

/// One published event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Job this event concerns.
    pub job_id: String,
    /// Project this job belongs to, if any.
    pub project_id: Option<String>,
    /// New lifecycle state, if this event is a state transition.
    pub state: Option<JobState>,
    /// Progress snapshot, if this event is a progress update.
    pub progress: Option<Progress>,
    /// Wall-clock time the event was published.
    pub timestamp: SystemTime,
}

struct Topics {
    channels: Mutex<HashMap<String, broadcast::Sender<Event>>>,
}

impl Topics {
    fn new() -> Self {
        let mut channels = HashMap::new();
        let (tx, _rx) = broadcast::channel(TOPIC_CAPACITY);
        channels.insert(JOBS_ALL_TOPIC.to_string(), tx);
        Self {
            channels: Mutex::new(channels),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Event> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

/// The event bus: one process-wide instance shared by the queue engine and
/// any subscriber (e.g. an SSE transport, one topic per client).
pub struct EventBus {
    topics: Topics,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Construct a fresh, empty event bus.
    pub fn new() -> Self {
        Self {
            topics: Topics::new(),
        }
    }

    /// Subscribe to a topic, creating its channel if this is the first
    /// subscriber. Handlers must not block — the broadcast send from
    /// `publish` is synchronous from the publisher's point of view.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Event> {
        self.topics.sender(topic).subscribe()
    }

    /// Publish `event` to `jobs:all`, and to `job:<job_id>` plus
    /// `project:<project_id>` (when set). A topic with no subscribers
    /// simply drops the event (broadcast semantics); this is not an error.
    pub fn publish(&self, event: Event) {
        let _ = self.topics.sender(JOBS_ALL_TOPIC).send(event.clone());
        let _ = self
            .topics
            .sender(&job_topic(&event.job_id))
            .send(event.clone());
        if let Some(project_id) = &event.project_id {
            let _ = self.topics.sender(&project_topic(project_id)).send(event);
        }
    }
}

/// Progress-phase percentage mapping: `phase` is one of the
/// ordered vocabulary `queued, analyzing, transforming, finalizing,
/// completed, failed, cancelled`; `fraction` (`0.0..=1.0`) is how far through
/// that phase the worker currently is. Returns `None` for `failed`/
/// `cancelled`, which have no percent mapping of their own — callers should
/// leave the job's last-reported percent in place.
pub fn phase_percent(phase: &str, fraction: f64) -> Option<u8> {
    let fraction = fraction.clamp(0.0, 1.0);
    match phase {
        "queued" => Some(0),
        "analyzing" => Some((15.0 + fraction * (30.0 - 15.0)).round() as u8),
        "transforming" => Some((40.0 + fraction * (80.0 - 40.0)).round() as u8),
        "finalizing" => Some(85),
        "completed" => Some(100),
        "failed" | "cancelled" => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_percent_matches_the_fixed_table() {
        assert_eq!(phase_percent("queued", 0.0), Some(0));
        assert_eq!(phase_percent("analyzing", 0.0), Some(15));
        assert_eq!(phase_percent("analyzing", 1.0), Some(30));
        assert_eq!(phase_percent("transforming", 0.0), Some(40));
        assert_eq!(phase_percent("transforming", 1.0), Some(80));
        assert_eq!(phase_percent("finalizing", 0.0), Some(85));
        assert_eq!(phase_percent("completed", 0.0), Some(100));
        assert_eq!(phase_percent("failed", 0.5), None);
        assert_eq!(phase_percent("cancelled", 0.5), None);
    }

    #[test]
    fn analyzing_fraction_interpolates_within_its_range() {
        assert_eq!(phase_percent("analyzing", 0.5), Some(23));
    }

    #[tokio::test]
    async fn publish_reaches_job_project_and_global_topics() {
        let bus = EventBus::new();
        let mut job_rx = bus.subscribe(&job_topic("j1"));
        let mut project_rx = bus.subscribe(&project_topic("p1"));
        let mut all_rx = bus.subscribe(JOBS_ALL_TOPIC);

        bus.publish(Event {
            job_id: "j1".to_string(),
            project_id: Some("p1".to_string()),
            state: Some(JobState::Running),
            progress: None,
            timestamp: SystemTime::now(),
        });

        assert_eq!(job_rx.recv().await.unwrap().job_id, "j1");
        assert_eq!(project_rx.recv().await.unwrap().job_id, "j1");
        assert_eq!(all_rx.recv().await.unwrap().job_id, "j1");
    }

    #[tokio::test]
    async fn event_with_no_project_only_reaches_job_and_global_topics() {
        let bus = EventBus::new();
        let mut project_rx = bus.subscribe(&project_topic("p1"));

        bus.publish(Event {
            job_id: "j2".to_string(),
            project_id: None,
            state: Some(JobState::Completed),
            progress: None,
            timestamp: SystemTime::now(),
        });

        assert!(project_rx.try_recv().is_err());
    }
}
