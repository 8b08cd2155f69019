//! `sonargate catalog`: batch-analyze and classify a directory.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cli::ui::{create_progress_bar, print_success, print_warning};
use crate::cli::CatalogArgs;
use crate::config::Config;
use crate::core::analyzers::AnalyzerOptions;
use crate::core::catalog::{self, CatalogOptions, GroundTruthEntry};
use crate::core::classification::heuristics::HeuristicsTable;

/// Execute `sonargate catalog`.
pub async fn execute(args: CatalogArgs, config: &Config) -> crate::Result<()> {
    let options = AnalyzerOptions {
        tool_path: config.invoker.tool_path.clone(),
        timeout_secs: config.invoker.timeout_secs,
    };
    let heuristics = match &config.platforms.heuristics_table_path {
        Some(path) => HeuristicsTable::load(path)?,
        None => HeuristicsTable::built_in(),
    };

    let ground_truth = match &args.ground_truth {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let map: HashMap<String, GroundTruthEntry> = serde_json::from_str(&text)?;
            Some(map)
        }
        None => None,
    };

    let validator = catalog::CatalogValidator::new(options, heuristics);

    let progress_bar = args.verbose.then(|| Arc::new(create_progress_bar(0)));
    let on_progress = progress_bar.clone().map(|pb| {
        Arc::new(move |completed: usize, total: usize| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
        }) as Arc<dyn Fn(usize, usize) + Send + Sync>
    });

    let catalog_options = CatalogOptions {
        root: args.catalog.clone(),
        ground_truth,
        sample: args.sample,
        parallelism: args.parallel,
        on_progress,
    };

    if args.verbose {
        println!("scanning {}...", args.catalog.display());
    }
    let (summary, files) = validator.validate(&catalog_options).await?;
    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    catalog::write_reports(&args.output, &summary, &files)?;

    print_success(&format!("processed {} files", summary.total_files));
    if let Some(accuracy) = summary.exact_match_accuracy {
        println!("exact-match accuracy: {:.1}%", accuracy * 100.0);
    }
    if let Some(accuracy) = summary.top3_accuracy {
        println!("top-3 accuracy: {:.1}%", accuracy * 100.0);
    }
    if !summary.low_confidence_samples.is_empty() {
        print_warning(&format!("{} files fell below the LOW confidence tier", summary.low_confidence_samples.len()));
    }

    Ok(())
}
