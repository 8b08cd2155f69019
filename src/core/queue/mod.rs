//! Job Queue Engine: five priority lanes, a bounded worker pool,
//! retry-with-backoff, and per-job-type pipelines.

pub mod engine;
pub mod job;
pub mod retry;
pub mod worker;

pub use engine::QueueEngine;
pub use job::{InMemoryJobStore, JobStore, QueueStats};
