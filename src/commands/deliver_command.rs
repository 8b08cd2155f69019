//! `sonargate deliver`: run one or more assets through the delivery
//! orchestrator.

use std::sync::Arc;

use crate::cli::table::{render, PlatformDeliveryRow};
use crate::cli::DeliverArgs;
use crate::config::Config;
use crate::core::conflict::Params;
use crate::core::delivery::{DeliveryOrchestrator, PlatformTable, SimulatedUploader};
use crate::core::events::EventBus;
use crate::core::queue::{InMemoryJobStore, QueueEngine};
use crate::core::types::{Delivery, DeliveryStatus, Progress};
use crate::core::{normalizer, types::AudioAsset};
use crate::error::SonarGateError;

/// Simulated upload failure rate.
const SIMULATED_UPLOAD_FAILURE_RATE: f64 = 0.1;

/// Execute `sonargate deliver`.
pub async fn execute(args: DeliverArgs, config: &Config) -> crate::Result<()> {
    let assets: Vec<AudioAsset> = args
        .assets
        .iter()
        .map(|path| normalizer::probe(path))
        .collect::<Result<_, _>>()?;

    let metadata = match &args.metadata {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => serde_json::json!({}),
    };

    let platforms = match &config.platforms.contract_table_path {
        Some(path) => PlatformTable::load(path)?,
        None => PlatformTable::built_in(),
    };

    let proposed_params: Params = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            let object = value
                .as_object()
                .ok_or_else(|| SonarGateError::config("parameter file must contain a JSON object"))?;
            object.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }
        None => Params::new(),
    };

    let store = Arc::new(InMemoryJobStore::new());
    let events = Arc::new(EventBus::new());
    let queue = Arc::new(QueueEngine::new(
        store,
        events,
        config.general.worker_pool_size,
        config.queue.retry_base_delay_secs,
    ));
    queue.spawn_workers(config.general.worker_pool_size);

    let uploader = Arc::new(SimulatedUploader::with_failure_rate(SIMULATED_UPLOAD_FAILURE_RATE));
    let orchestrator = DeliveryOrchestrator::new(platforms, queue, uploader).with_proposed_params(proposed_params);

    let mut delivery = Delivery {
        id: uuid::Uuid::new_v4().to_string(),
        assets: args.assets.clone(),
        platforms: args.platforms.clone(),
        metadata,
        status: DeliveryStatus::Pending,
        progress: Progress {
            phase: "queued".to_string(),
            percent: 0,
            message: String::new(),
        },
        per_platform: std::collections::HashMap::new(),
    };

    orchestrator.run(&mut delivery, &assets).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&delivery)?);
    } else {
        let rows = delivery
            .per_platform
            .iter()
            .map(|(platform, state)| PlatformDeliveryRow {
                platform: platform.clone(),
                status: format!("{:?}", state.status),
                error: state.error.clone().unwrap_or_default(),
            })
            .collect();
        println!("{}", render(rows));
        println!("overall: {:?}", delivery.status);
    }

    if delivery.status == DeliveryStatus::Failed {
        return Err(SonarGateError::system("every requested platform failed"));
    }

    Ok(())
}
