//! Analyzer suite. Each analyzer is independent: none calls
//! another, and each takes a decoded/measured asset and produces an
//! [`AnalyzerReport`](crate::core::types::AnalyzerReport).
//!
//! Every analyzer's status enum follows the same ladder shape (NONE → … →
//! CRITICAL or equivalent); [`Severity`] names that common ladder, and each
//! analyzer's own domain-specific status enum provides `to_severity()` for
//! code that needs to compare across analyzers (e.g. the catalog
//! validator's issue counts). See DESIGN.md for why this shape was chosen.

pub mod channel_topology;
pub mod clipping;
pub mod club_stress;
pub mod dsp;
pub mod gain_reduction;
pub mod intersample_peak;
pub mod loudness;
pub mod metadata_checker;
pub mod platform_targets;
pub mod replaygain;
pub mod spectral_balance;

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// The shared status ladder used to compare severity across analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// No issue.
    None,
    /// Minor, likely inaudible.
    Low,
    /// Noticeable but not urgent.
    Moderate,
    /// Should be addressed before delivery.
    High,
    /// Must be addressed before delivery.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::None => "NONE",
            Severity::Low => "LOW",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// A lightweight result for `quickCheck`, cheaper than a full `analyze`.
#[derive(Debug, Clone)]
pub struct CompactReport {
    /// Analyzer-specific status label.
    pub status: String,
    /// Overall score, when applicable.
    pub score: Option<f64>,
}

/// Options threaded through an analyzer's `analyze` call (mainly the
/// invoker settings it needs to run the external tool).
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Path to the external measurement binary.
    pub tool_path: String,
    /// Per-invocation timeout in seconds.
    pub timeout_secs: u64,
}

/// Shared analyzer contract: `analyze`, `quickCheck`,
/// `classify`. `classify` is the pure, synchronous decision logic, fully
/// unit-testable without the external tool; `analyze` wraps it with the
/// external-tool invocation and converts a measurement failure into
/// confidence 0 / this analyzer's neutral status rather than propagating
/// an error.
#[async_trait]
pub trait Analyzer {
    /// The analyzer-specific metrics type `classify` consumes.
    type Metrics;

    /// Run the full analysis: invoke the external tool, then classify.
    async fn analyze(&self, path: &Path, options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport>;

    /// A cheap, tool-free check (or one using only cached measurements).
    fn quick_check(&self, path: &Path) -> SonarGateResult<CompactReport>;

    /// Pure classification over already-gathered metrics.
    fn classify(&self, metrics: &Self::Metrics) -> AnalyzerReport;
}

/// Build a neutral, zero-confidence report for when a required metric is
/// missing.
pub fn neutral_report(neutral_status: &str, description: impl Into<String>) -> AnalyzerReport {
    AnalyzerReport {
        status: neutral_status.to_string(),
        score: None,
        measurements: serde_json::json!({}),
        description: description.into(),
        recommendations: Vec::new(),
        confidence: 0.0,
        analysis_time_ms: 0,
    }
}

/// Convenience: true iff every named key is present and non-`None` in a
/// metrics map, used by `classify` implementations that require a set of
/// fields before they can produce a non-neutral report.
pub fn all_present(metrics: &HashMap<String, Option<f64>>, keys: &[&str]) -> bool {
    keys.iter().all(|k| matches!(metrics.get(*k), Some(Some(_))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_low_to_critical() {
        assert!(Severity::None < Severity::Low);
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::Moderate < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn all_present_detects_missing_key() {
        let mut m = HashMap::new();
        m.insert("a".to_string(), Some(1.0));
        m.insert("b".to_string(), None);
        assert!(all_present(&m, &["a"]));
        assert!(!all_present(&m, &["a", "b"]));
    }
}
