//! Per-file result shape and aggregation into a summary.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::types::Classification;

/// Ground-truth entry for one file, keyed by filename in the supplied map.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroundTruthEntry {
    /// Expected primary subgenre.
    pub subgenre: String,
    /// Expected confidence, for reference only (not compared).
    pub confidence: f64,
}

/// Confidence-tier bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    /// `>= 0.85`.
    High,
    /// `>= 0.70`.
    Good,
    /// `>= 0.55`.
    Moderate,
    /// `>= 0.40`.
    Low,
    /// `< 0.40`.
    VeryLow,
}

impl ConfidenceTier {
    /// Bucket a confidence value into its tier.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.85 {
            ConfidenceTier::High
        } else if confidence >= 0.70 {
            ConfidenceTier::Good
        } else if confidence >= 0.55 {
            ConfidenceTier::Moderate
        } else if confidence >= 0.40 {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::VeryLow
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ConfidenceTier::High => "HIGH",
            ConfidenceTier::Good => "GOOD",
            ConfidenceTier::Moderate => "MODERATE",
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::VeryLow => "VERY_LOW",
        }
    }
}

/// Outcome of classifying and optionally ground-truth-comparing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Path to the scanned file.
    pub path: PathBuf,
    /// This file's classification, if the analyzer suite produced one.
    pub classification: Option<Classification>,
    /// Count of issues (non-`NONE`/non-`CRITICAL`-absent statuses) surfaced
    /// across the analyzer suite, keyed by analyzer name.
    pub issue_counts_by_source: HashMap<String, usize>,
    /// `true` iff `classification.primary` exactly matches the ground truth.
    pub exact_match: Option<bool>,
    /// `true` iff the ground truth subgenre appears in the top 3 candidates.
    pub top3_match: Option<bool>,
}

/// The aggregate catalog summary: written without the
/// per-file array, which lives only in the `.full.json` companion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSummary {
    /// Total files processed.
    pub total_files: usize,
    /// Count of files per primary subgenre.
    pub subgenre_distribution: HashMap<String, usize>,
    /// Count of files per confidence tier.
    pub confidence_tier_distribution: HashMap<String, usize>,
    /// Exact-match accuracy against ground truth, if any was supplied.
    pub exact_match_accuracy: Option<f64>,
    /// Top-3 accuracy against ground truth, if any was supplied.
    pub top3_accuracy: Option<f64>,
    /// Per-subgenre `(exact, top3)` accuracy, ground-truth files only.
    pub per_subgenre_accuracy: HashMap<String, (f64, f64)>,
    /// Total issue count by analyzer name, across every file.
    pub issue_counts_by_source: HashMap<String, usize>,
    /// Paths whose confidence fell in `LOW` or `VERY_LOW`.
    pub low_confidence_samples: Vec<PathBuf>,
    /// Paths that ground-truth-mismatched on the primary label.
    pub misclassified_samples: Vec<PathBuf>,
}

/// Aggregate a batch of [`FileResult`]s into a [`CatalogSummary`]. Pure and
/// independently testable from the scan/classify machinery around it.
pub fn aggregate(results: &[FileResult]) -> CatalogSummary {
    let mut summary = CatalogSummary {
        total_files: results.len(),
        ..Default::default()
    };

    let mut per_subgenre_counts: HashMap<String, (usize, usize, usize)> = HashMap::new(); // (total, exact, top3)
    let mut exact_total = 0usize;
    let mut exact_hits = 0usize;
    let mut top3_total = 0usize;
    let mut top3_hits = 0usize;

    for result in results {
        if let Some(classification) = &result.classification {
            *summary.subgenre_distribution.entry(classification.primary.0.clone()).or_insert(0) += 1;
            let tier = ConfidenceTier::from_confidence(classification.confidence);
            *summary.confidence_tier_distribution.entry(tier.as_str().to_string()).or_insert(0) += 1;
            if matches!(tier, ConfidenceTier::Low | ConfidenceTier::VeryLow) {
                summary.low_confidence_samples.push(result.path.clone());
            }

            if let Some(exact) = result.exact_match {
                exact_total += 1;
                exact_hits += exact as usize;
                let entry = per_subgenre_counts.entry(classification.primary.0.clone()).or_insert((0, 0, 0));
                entry.0 += 1;
                entry.1 += exact as usize;
                if !exact {
                    summary.misclassified_samples.push(result.path.clone());
                }
            }
            if let Some(top3) = result.top3_match {
                top3_total += 1;
                top3_hits += top3 as usize;
                let entry = per_subgenre_counts.entry(classification.primary.0.clone()).or_insert((0, 0, 0));
                entry.2 += top3 as usize;
            }
        }

        for (source, count) in &result.issue_counts_by_source {
            *summary.issue_counts_by_source.entry(source.clone()).or_insert(0) += count;
        }
    }

    summary.exact_match_accuracy = (exact_total > 0).then(|| exact_hits as f64 / exact_total as f64);
    summary.top3_accuracy = (top3_total > 0).then(|| top3_hits as f64 / top3_total as f64);
    summary.per_subgenre_accuracy = per_subgenre_counts
        .into_iter()
        .map(|(genre, (total, exact, top3))| {
            let denom = total.max(1) as f64;
            (genre, (exact as f64 / denom, top3 as f64 / denom))
        })
        .collect();

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Subgenre;

    fn classified(primary: &str, confidence: f64) -> Classification {
        Classification {
            primary: Subgenre::from(primary),
            confidence,
            is_uncertain: false,
            conflicting_signals: false,
            top_candidates: vec![],
            likelihoods: HashMap::new(),
        }
    }

    #[test]
    fn confidence_tier_boundaries() {
        assert_eq!(ConfidenceTier::from_confidence(0.85), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.70), ConfidenceTier::Good);
        assert_eq!(ConfidenceTier::from_confidence(0.55), ConfidenceTier::Moderate);
        assert_eq!(ConfidenceTier::from_confidence(0.40), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_confidence(0.39), ConfidenceTier::VeryLow);
    }

    #[test]
    fn aggregate_computes_exact_and_top3_accuracy() {
        let results = vec![
            FileResult {
                path: "a.wav".into(),
                classification: Some(classified("TRAP", 0.9)),
                issue_counts_by_source: HashMap::new(),
                exact_match: Some(true),
                top3_match: Some(true),
            },
            FileResult {
                path: "b.wav".into(),
                classification: Some(classified("HOUSE", 0.6)),
                issue_counts_by_source: HashMap::new(),
                exact_match: Some(false),
                top3_match: Some(true),
            },
        ];
        let summary = aggregate(&results);
        assert_eq!(summary.exact_match_accuracy, Some(0.5));
        assert_eq!(summary.top3_accuracy, Some(1.0));
        assert_eq!(summary.misclassified_samples, vec![PathBuf::from("b.wav")]);
    }

    #[test]
    fn low_confidence_files_are_flagged() {
        let results = vec![FileResult {
            path: "c.wav".into(),
            classification: Some(classified("LOFI", 0.2)),
            issue_counts_by_source: HashMap::new(),
            exact_match: None,
            top3_match: None,
        }];
        let summary = aggregate(&results);
        assert_eq!(summary.low_confidence_samples, vec![PathBuf::from("c.wav")]);
        assert!(summary.exact_match_accuracy.is_none());
    }
}
