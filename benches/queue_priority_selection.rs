use std::sync::Arc;
use std::time::SystemTime;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sonargate::core::events::EventBus;
use sonargate::core::queue::{InMemoryJobStore, QueueEngine};
use sonargate::core::types::{Job, JobPriority, JobState, JobType, Progress};

fn make_job(id: &str, priority: JobPriority) -> Job {
    Job {
        id: id.to_string(),
        job_type: JobType::Analyze,
        priority,
        state: JobState::Queued,
        data: serde_json::json!({}),
        config: serde_json::json!({}),
        attempts: 0,
        max_attempts: 1,
        created_at: SystemTime::now(),
        updated_at: SystemTime::now(),
        progress: Progress::default(),
        result: None,
        error: None,
    }
}

fn bench_enqueue_across_priorities(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("queue: enqueue across all five priority lanes", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Arc::new(InMemoryJobStore::new());
                let events = Arc::new(EventBus::new());
                // pool_size 0 worker pool (no spawn_workers call) keeps this
                // benchmark isolated to lane insertion, not pipeline execution.
                let engine = QueueEngine::new(store, events, 1, 1);

                for (i, priority) in JobPriority::ALL.iter().enumerate() {
                    let job = make_job(&format!("job-{i}"), black_box(*priority));
                    engine.enqueue(job).await.unwrap();
                }
            });
        });
    });
}

criterion_group!(benches, bench_enqueue_across_priorities);
criterion_main!(benches);
