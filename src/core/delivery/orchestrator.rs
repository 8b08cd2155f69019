//! Delivery Orchestrator: sequential `validate -> process ->
//! upload` per [`Delivery`], with per-platform failures isolated — one
//! platform failing never aborts the others.

use std::sync::Arc;
use std::time::SystemTime;

use crate::core::conflict::Params;
use crate::core::queue::QueueEngine;
use crate::core::types::{
    AudioAsset, Delivery, DeliveryStatus, Job, JobPriority, JobState, JobType, PlatformDeliveryState,
    Progress,
};
use crate::error::SonarGateResult;

use super::platforms::PlatformTable;
use super::upload::PlatformUploader;

/// Minimum loudness offset (in LU) from a platform's target that triggers
/// a PROCESS job before upload.
const LOUDNESS_OFFSET_THRESHOLD_LU: f64 = 0.1;

/// Orchestrates one [`Delivery`] through validation, processing, and upload.
pub struct DeliveryOrchestrator {
    platforms: PlatformTable,
    queue: Arc<QueueEngine>,
    uploader: Arc<dyn PlatformUploader>,
    proposed_params: Params,
}

impl DeliveryOrchestrator {
    /// Construct an orchestrator over `platforms`, dispatching PROCESS jobs
    /// through `queue` and uploading through `uploader`. Any PROCESS job
    /// this orchestrator enqueues carries an empty parameter set; use
    /// [`Self::with_proposed_params`] to attach one the queue engine can
    /// gate against the conflict catalog.
    pub fn new(platforms: PlatformTable, queue: Arc<QueueEngine>, uploader: Arc<dyn PlatformUploader>) -> Self {
        Self { platforms, queue, uploader, proposed_params: Params::new() }
    }

    /// Attach the processing parameters a PROCESS job would apply, so the
    /// queue engine can refuse to enqueue it on a BLOCKING conflict.
    pub fn with_proposed_params(mut self, proposed_params: Params) -> Self {
        self.proposed_params = proposed_params;
        self
    }

    /// True iff `asset` needs processing before it can go to `platform`: a
    /// format mismatch, or a loudness offset beyond the tolerance threshold.
    fn asset_needs_processing(asset: &AudioAsset, contract: &super::platforms::PlatformContract) -> bool {
        let format_mismatch = !contract.formats.iter().any(|f| f.eq_ignore_ascii_case(&asset.format));
        let loudness_offset = asset
            .loudness
            .map(|l| (l - contract.loudness_target_lufs).abs())
            .unwrap_or(0.0);
        format_mismatch || loudness_offset > LOUDNESS_OFFSET_THRESHOLD_LU
    }

    fn validate_asset(asset: &AudioAsset, contract: &super::platforms::PlatformContract) -> Vec<String> {
        let mut errors = Vec::new();
        if !contract.formats.iter().any(|f| f.eq_ignore_ascii_case(&asset.format)) {
            errors.push(format!("format '{}' not in {:?}", asset.format, contract.formats));
        }
        if asset.bit_depth != 0 && asset.bit_depth < contract.min_bit_depth {
            errors.push(format!("bit depth {} below minimum {}", asset.bit_depth, contract.min_bit_depth));
        }
        if asset.sample_rate < contract.min_sample_rate {
            errors.push(format!(
                "sample rate {} below minimum {}",
                asset.sample_rate, contract.min_sample_rate
            ));
        }
        if asset.file_size > contract.max_file_size_bytes {
            errors.push(format!(
                "file size {} exceeds maximum {}",
                asset.file_size, contract.max_file_size_bytes
            ));
        }
        if let Some(loudness) = asset.loudness {
            if (loudness - contract.loudness_target_lufs).abs() > contract.loudness_tolerance_lu * 3.0 {
                errors.push(format!(
                    "loudness {loudness:.1} LUFS far outside target {:.1} +/- {:.1} LU",
                    contract.loudness_target_lufs, contract.loudness_tolerance_lu
                ));
            }
        }
        errors
    }

    fn validate_metadata(metadata: &serde_json::Value, contract: &super::platforms::PlatformContract) -> Vec<String> {
        contract
            .required_metadata
            .iter()
            .filter(|field| {
                metadata
                    .get(field.as_str())
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|field| format!("required metadata field '{field}' is missing"))
            .collect()
    }

    /// Run the full `validate -> process -> upload` workflow, mutating
    /// `delivery`'s status/progress/per-platform state in place.
    pub async fn run(&self, delivery: &mut Delivery, assets: &[AudioAsset]) -> SonarGateResult<()> {
        delivery.status = DeliveryStatus::Validating;
        delivery.progress = Progress {
            phase: "validating".to_string(),
            percent: 10,
            message: "checking platform requirements".to_string(),
        };

        let mut eligible = Vec::new();
        for platform_id in &delivery.platforms {
            let Some(contract) = self.platforms.find(platform_id) else {
                delivery.per_platform.insert(
                    platform_id.clone(),
                    failed_state("unknown platform contract".to_string()),
                );
                continue;
            };

            let mut errors = Self::validate_metadata(&delivery.metadata, contract);
            for asset in assets {
                errors.extend(Self::validate_asset(asset, contract));
            }

            if errors.is_empty() {
                eligible.push(platform_id.clone());
            } else {
                delivery.per_platform.insert(platform_id.clone(), failed_state(errors.join("; ")));
            }
        }

        delivery.status = DeliveryStatus::Processing;
        delivery.progress.percent = 40;
        delivery.progress.phase = "processing".to_string();

        let mut still_eligible = Vec::new();
        for platform_id in eligible {
            let contract = self.platforms.find(&platform_id).expect("validated above");
            let needs_processing = assets.iter().any(|a| Self::asset_needs_processing(a, contract));

            if needs_processing {
                let job = Job {
                    id: uuid::Uuid::new_v4().to_string(),
                    job_type: JobType::Process,
                    priority: JobPriority::High,
                    state: JobState::Queued,
                    data: serde_json::json!({ "platform": platform_id, "proposedParams": self.proposed_params }),
                    config: serde_json::json!({}),
                    attempts: 0,
                    max_attempts: 3,
                    created_at: SystemTime::now(),
                    updated_at: SystemTime::now(),
                    progress: Progress::default(),
                    result: None,
                    error: None,
                };
                let job_id = match self.queue.enqueue(job).await {
                    Ok(id) => id,
                    Err(err) => {
                        delivery.per_platform.insert(platform_id, failed_state(err.to_string()));
                        continue;
                    }
                };
                match self.await_terminal(&job_id).await? {
                    JobState::Completed => still_eligible.push(platform_id),
                    _ => {
                        delivery
                            .per_platform
                            .insert(platform_id, failed_state("PROCESS job did not complete".to_string()));
                    }
                }
            } else {
                still_eligible.push(platform_id);
            }
        }

        delivery.status = DeliveryStatus::Uploading;
        delivery.progress.percent = 80;
        delivery.progress.phase = "uploading".to_string();

        let mut successful = 0usize;
        for platform_id in still_eligible {
            let started_at = Some(SystemTime::now());
            let asset_path = assets.first().map(|a| a.path.clone()).unwrap_or_default();
            match self.uploader.upload(&platform_id, &asset_path).await {
                Ok(receipt) => {
                    successful += 1;
                    delivery.per_platform.insert(
                        platform_id,
                        PlatformDeliveryState {
                            status: DeliveryStatus::Delivered,
                            error: None,
                            upload_id: Some(receipt.upload_id),
                            url: Some(receipt.url),
                            started_at,
                            completed_at: Some(SystemTime::now()),
                        },
                    );
                }
                Err(err) => {
                    delivery.per_platform.insert(
                        platform_id,
                        PlatformDeliveryState {
                            status: DeliveryStatus::Failed,
                            error: Some(err.to_string()),
                            upload_id: None,
                            url: None,
                            started_at,
                            completed_at: Some(SystemTime::now()),
                        },
                    );
                }
            }
        }

        let all_terminal = delivery
            .per_platform
            .values()
            .all(|s| matches!(s.status, DeliveryStatus::Delivered | DeliveryStatus::Failed | DeliveryStatus::Rejected));
        delivery.status = if successful > 0 && all_terminal {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Failed
        };
        delivery.progress = Progress {
            phase: "completed".to_string(),
            percent: 100,
            message: format!("{successful}/{} platforms delivered", delivery.platforms.len()),
        };

        Ok(())
    }

    async fn await_terminal(&self, job_id: &str) -> SonarGateResult<JobState> {
        loop {
            if let Some(job) = self.queue.get_job(job_id).await? {
                if matches!(job.state, JobState::Completed | JobState::Failed | JobState::Cancelled) {
                    return Ok(job.state);
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }
}

fn failed_state(error: String) -> PlatformDeliveryState {
    PlatformDeliveryState {
        status: DeliveryStatus::Failed,
        error: Some(error),
        upload_id: None,
        url: None,
        started_at: Some(SystemTime::now()),
        completed_at: Some(SystemTime::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::delivery::upload::SimulatedUploader;
    use crate::core::events::EventBus;
    use crate::core::queue::InMemoryJobStore;

    fn asset(format: &str, loudness: f64) -> AudioAsset {
        AudioAsset {
            path: "track.wav".into(),
            format: format.to_string(),
            sample_rate: 48_000,
            bit_depth: 24,
            channels: 2,
            file_size: 1024,
            duration: 180.0,
            loudness: Some(loudness),
        }
    }

    fn make_delivery(platforms: &[&str]) -> Delivery {
        Delivery {
            id: "d1".to_string(),
            assets: vec!["track.wav".into()],
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            metadata: serde_json::json!({ "title": "T", "artist": "A", "isrc": "US1234567890" }),
            status: DeliveryStatus::Pending,
            progress: Progress::default(),
            per_platform: Default::default(),
        }
    }

    fn orchestrator(failure_rate: f64) -> DeliveryOrchestrator {
        let store = Arc::new(InMemoryJobStore::new());
        let events = Arc::new(EventBus::new());
        let queue = Arc::new(QueueEngine::new(store, events, 2, 5));
        queue.spawn_workers(2);
        DeliveryOrchestrator::new(
            PlatformTable::built_in(),
            queue,
            Arc::new(SimulatedUploader::with_failure_rate(failure_rate)),
        )
    }

    #[tokio::test]
    async fn clean_asset_delivers_without_processing() {
        let orch = orchestrator(0.0);
        let mut delivery = make_delivery(&["spotify"]);
        let assets = vec![asset("wav", -14.0)];
        orch.run(&mut delivery, &assets).await.unwrap();
        assert_eq!(delivery.status, DeliveryStatus::Delivered);
        assert!(delivery.per_platform["spotify"].upload_id.is_some());
    }

    #[tokio::test]
    async fn unknown_platform_fails_in_isolation() {
        let orch = orchestrator(0.0);
        let mut delivery = make_delivery(&["spotify", "not_a_real_platform"]);
        let assets = vec![asset("wav", -14.0)];
        orch.run(&mut delivery, &assets).await.unwrap();
        assert_eq!(delivery.per_platform["not_a_real_platform"].status, DeliveryStatus::Failed);
        assert_eq!(delivery.per_platform["spotify"].status, DeliveryStatus::Delivered);
        // One platform succeeded, so the delivery as a whole still counts delivered.
        assert_eq!(delivery.status, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn missing_required_metadata_fails_that_platform() {
        let orch = orchestrator(0.0);
        let mut delivery = make_delivery(&["apple_music"]);
        delivery.metadata = serde_json::json!({ "title": "T" });
        let assets = vec![asset("wav", -16.0)];
        orch.run(&mut delivery, &assets).await.unwrap();
        assert_eq!(delivery.per_platform["apple_music"].status, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn format_mismatch_routes_through_a_process_job() {
        let orch = orchestrator(0.0);
        let mut delivery = make_delivery(&["spotify"]);
        let assets = vec![asset("mp3", -14.0)];
        orch.run(&mut delivery, &assets).await.unwrap();
        // mp3 isn't in spotify's accepted formats, so validation itself fails
        // it before processing is ever reached.
        assert_eq!(delivery.per_platform["spotify"].status, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn blocking_conflict_in_proposed_params_fails_that_platform_instead_of_processing() {
        let orch = orchestrator(0.0).with_proposed_params(
            [("eqBoostMax".to_string(), serde_json::json!(13.0))].into_iter().collect(),
        );
        let mut delivery = make_delivery(&["ebu_broadcast"]);
        // Outside the processing-trigger offset but still within ebu_broadcast's
        // looser validation tolerance, so this platform reaches the PROCESS stage.
        let assets = vec![asset("wav", -22.5)];
        orch.run(&mut delivery, &assets).await.unwrap();
        assert_eq!(delivery.per_platform["ebu_broadcast"].status, DeliveryStatus::Failed);
    }
}
