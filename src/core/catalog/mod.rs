//! Catalog Validator: batched analyzer runs over a directory, with
//! optional ground-truth comparison and aggregate reports.

pub mod aggregate;
pub mod scanner;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;

use crate::core::analyzers::{
    channel_topology::ChannelTopologyAnalyzer, clipping::ClippingAnalyzer, club_stress::ClubStressAnalyzer,
    gain_reduction::GainReductionAnalyzer, intersample_peak::IntersamplePeakAnalyzer, loudness::LoudnessAnalyzer,
    replaygain::ReplayGainAnalyzer, spectral_balance::SpectralBalanceAnalyzer, Analyzer, AnalyzerOptions,
};
use crate::core::classification::{self, heuristics::HeuristicsTable, signals_bridge};
use crate::core::types::{AnalyzerReport, Classification};
use crate::error::SonarGateResult;

pub use aggregate::{CatalogSummary, ConfidenceTier, FileResult, GroundTruthEntry};

/// Files are processed in batches of this size, each batch fully parallel.
const BATCH_SIZE: usize = 50;

/// Options controlling one catalog validation run.
pub struct CatalogOptions {
    /// Root directory to scan.
    pub root: PathBuf,
    /// Optional ground-truth map, filename (as in [`scanner::scan_directory`]
    /// output, stringified) to expected label.
    pub ground_truth: Option<HashMap<String, GroundTruthEntry>>,
    /// `None` processes every discovered file; `Some(n)` samples `n` first.
    pub sample: Option<usize>,
    /// Concurrent analyzer runs within a batch.
    pub parallelism: usize,
    /// Optional `(completed, total)` callback, invoked after each file
    /// finishes (successfully or not). Lets a caller drive a progress bar
    /// without this module depending on any particular rendering crate.
    pub on_progress: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
}

/// Runs the analyzer suite + classification over a catalog directory.
pub struct CatalogValidator {
    options: Arc<AnalyzerOptions>,
    heuristics: HeuristicsTable,
}

impl CatalogValidator {
    /// Construct a validator using `options` for every analyzer invocation
    /// and `heuristics` for subgenre classification.
    pub fn new(options: AnalyzerOptions, heuristics: HeuristicsTable) -> Self {
        Self {
            options: Arc::new(options),
            heuristics,
        }
    }

    async fn analyze_one(&self, path: &Path) -> HashMap<String, AnalyzerReport> {
        let loudness = LoudnessAnalyzer::new(&self.options);
        let intersample_peak = IntersamplePeakAnalyzer::new(&self.options);
        let clipping = ClippingAnalyzer::new(&self.options);
        let club_stress = ClubStressAnalyzer::new(&self.options);
        let channel_topology = ChannelTopologyAnalyzer::new(&self.options);
        let spectral_balance = SpectralBalanceAnalyzer::new(&self.options);
        let gain_reduction = GainReductionAnalyzer::new(&self.options);
        let replaygain = ReplayGainAnalyzer::new(&self.options, vec!["spotify".to_string(), "apple_music".to_string()]);

        let (loudness, intersample_peak, clipping, club_stress, channel_topology, spectral_balance, gain_reduction, replaygain) = tokio::join!(
            loudness.analyze(path, &self.options),
            intersample_peak.analyze(path, &self.options),
            clipping.analyze(path, &self.options),
            club_stress.analyze(path, &self.options),
            channel_topology.analyze(path, &self.options),
            spectral_balance.analyze(path, &self.options),
            gain_reduction.analyze(path, &self.options),
            replaygain.analyze(path, &self.options),
        );

        let mut reports = HashMap::new();
        for (name, result) in [
            ("loudness", loudness),
            ("intersample_peak", intersample_peak),
            ("clipping", clipping),
            ("club_stress", club_stress),
            ("channel_topology", channel_topology),
            ("spectral_balance", spectral_balance),
            ("gain_reduction", gain_reduction),
            ("replaygain", replaygain),
        ] {
            if let Ok(report) = result {
                reports.insert(name.to_string(), report);
            }
        }
        reports
    }

    fn classify(&self, reports: &HashMap<String, AnalyzerReport>) -> Option<Classification> {
        let signals = signals_bridge::approximate_signals_from_reports(reports);
        classification::classify(&signals, &self.heuristics)
    }

    async fn run_file(
        &self,
        path: PathBuf,
        ground_truth: &Option<HashMap<String, GroundTruthEntry>>,
    ) -> FileResult {
        let reports = self.analyze_one(&path).await;
        let classification = self.classify(&reports);

        let issue_counts_by_source = reports
            .iter()
            .map(|(name, report)| (name.clone(), usize::from(report.status != "NONE" && report.confidence > 0.0)))
            .collect();

        let key = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        let truth = ground_truth.as_ref().and_then(|map| map.get(&key));
        let (exact_match, top3_match) = match (&classification, truth) {
            (Some(c), Some(truth)) => (
                Some(c.primary.0 == truth.subgenre),
                Some(c.top_candidates.iter().any(|(name, _)| name.0 == truth.subgenre)),
            ),
            _ => (None, None),
        };

        FileResult {
            path,
            classification,
            issue_counts_by_source,
            exact_match,
            top3_match,
        }
    }

    /// Run a full catalog validation: scan, optional sample, batched
    /// analysis, aggregation.
    pub async fn validate(&self, opts: &CatalogOptions) -> SonarGateResult<(CatalogSummary, Vec<FileResult>)> {
        let mut files = scanner::scan_directory(&opts.root)?;
        if let Some(n) = opts.sample {
            files = scanner::sample(files, n);
        }

        let semaphore = Arc::new(Semaphore::new(opts.parallelism.max(1)));
        let total = files.len();
        let mut completed = 0usize;
        let mut all_results = Vec::with_capacity(total);

        for batch in files.chunks(BATCH_SIZE) {
            let mut set = tokio::task::JoinSet::new();
            for path in batch {
                let path = path.clone();
                let ground_truth = opts.ground_truth.clone();
                let semaphore = Arc::clone(&semaphore);
                let options = Arc::clone(&self.options);
                let heuristics = self.heuristics.clone();
                set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.unwrap();
                    let validator = CatalogValidator {
                        options,
                        heuristics,
                    };
                    validator.run_file(path, &ground_truth).await
                });
            }
            while let Some(result) = set.join_next().await {
                if let Ok(file_result) = result {
                    all_results.push(file_result);
                }
                completed += 1;
                if let Some(on_progress) = &opts.on_progress {
                    on_progress(completed, total);
                }
            }
        }

        let summary = aggregate::aggregate(&all_results);
        Ok((summary, all_results))
    }
}

/// Paired summary + full-report artifacts: a compact summary plus a
/// `.full.json` companion carrying the full per-file array.
#[derive(Debug, Serialize)]
pub struct CatalogReport<'a> {
    /// The aggregate summary.
    pub summary: &'a CatalogSummary,
}

/// Full report, written to the `.full.json` companion.
#[derive(Debug, Serialize)]
pub struct CatalogFullReport<'a> {
    /// The aggregate summary, repeated for standalone readability.
    pub summary: &'a CatalogSummary,
    /// Every per-file result.
    pub files: &'a [FileResult],
}

/// Write `summary` to `output_path` and `files` to `<output_path>` with
/// its extension replaced by `.full.json`.
pub fn write_reports(output_path: &Path, summary: &CatalogSummary, files: &[FileResult]) -> SonarGateResult<()> {
    let summary_json = serde_json::to_string_pretty(&CatalogReport { summary })?;
    std::fs::write(output_path, summary_json)?;

    let full_path = full_report_path(output_path);
    let full_json = serde_json::to_string_pretty(&CatalogFullReport { summary, files })?;
    std::fs::write(full_path, full_json)?;
    Ok(())
}

fn full_report_path(output_path: &Path) -> PathBuf {
    let stem = output_path.file_stem().and_then(|s| s.to_str()).unwrap_or("catalog");
    let dir = output_path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{stem}.full.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_report_path_appends_suffix_before_extension() {
        let path = PathBuf::from("/tmp/report.json");
        assert_eq!(full_report_path(&path), PathBuf::from("/tmp/report.full.json"));
    }
}
