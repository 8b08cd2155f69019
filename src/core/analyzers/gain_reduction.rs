//! Gain Reduction Pattern analyzer: classifies windowed
//! compression intensity from crest-factor drop, then looks at how that
//! intensity evolves across the track to classify an aggregate pattern.

use std::path::Path;

use async_trait::async_trait;

use super::{Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::invoker::{schema::MetricSchema, Invoker};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when crest factor could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";

/// Per-window compression intensity, from crest-factor reduction relative
/// to an uncompressed reference of ~18 dB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindowIntensity {
    /// Crest factor near the uncompressed reference.
    None,
    /// Small crest-factor drop.
    Minimal,
    /// Light compression.
    Light,
    /// Moderate compression.
    Moderate,
    /// Heavy compression.
    Heavy,
    /// Crest factor collapsed almost entirely.
    Extreme,
}

impl WindowIntensity {
    fn as_str(self) -> &'static str {
        match self {
            WindowIntensity::None => "NONE",
            WindowIntensity::Minimal => "MINIMAL",
            WindowIntensity::Light => "LIGHT",
            WindowIntensity::Moderate => "MODERATE",
            WindowIntensity::Heavy => "HEAVY",
            WindowIntensity::Extreme => "EXTREME",
        }
    }

    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            WindowIntensity::None | WindowIntensity::Minimal => Severity::None,
            WindowIntensity::Light => Severity::Low,
            WindowIntensity::Moderate => Severity::Moderate,
            WindowIntensity::Heavy => Severity::High,
            WindowIntensity::Extreme => Severity::Critical,
        }
    }
}

/// Classify a single window's crest factor (in dB) into an intensity
/// bucket. Per the Open Question resolution (DESIGN.md), windows are
/// always computed against the normalized 48 kHz path so thresholds stay
/// comparable across source sample rates.
pub fn classify_window(crest_factor_db: f64) -> WindowIntensity {
    if crest_factor_db >= 18.0 {
        WindowIntensity::None
    } else if crest_factor_db >= 14.0 {
        WindowIntensity::Minimal
    } else if crest_factor_db >= 10.0 {
        WindowIntensity::Light
    } else if crest_factor_db >= 6.0 {
        WindowIntensity::Moderate
    } else if crest_factor_db >= 4.0 {
        WindowIntensity::Heavy
    } else {
        WindowIntensity::Extreme
    }
}

/// How compression intensity evolves across a track's windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatePattern {
    /// Consistent intensity throughout.
    Uniform,
    /// Intensity increases toward the end.
    Escalating,
    /// Intensity decreases toward the end.
    DeEscalating,
    /// Alternates between distinct levels, consistent with verse/chorus
    /// dynamics.
    VerseChorusVariance,
    /// No stable pattern; intensity moves unpredictably.
    Dynamic,
    /// Too few windows carry meaningful compression to classify.
    Sparse,
}

impl AggregatePattern {
    fn as_str(self) -> &'static str {
        match self {
            AggregatePattern::Uniform => "UNIFORM",
            AggregatePattern::Escalating => "ESCALATING",
            AggregatePattern::DeEscalating => "DE_ESCALATING",
            AggregatePattern::VerseChorusVariance => "VERSE_CHORUS_VARIANCE",
            AggregatePattern::Dynamic => "DYNAMIC",
            AggregatePattern::Sparse => "SPARSE",
        }
    }
}

/// Classify the aggregate pattern across a sequence of per-window crest
/// factors (in dB, in chronological order).
pub fn classify_aggregate(window_crest_db: &[f64]) -> AggregatePattern {
    if window_crest_db.len() < 3 {
        return AggregatePattern::Sparse;
    }

    let levels: Vec<WindowIntensity> = window_crest_db.iter().copied().map(classify_window).collect();
    let distinct: std::collections::BTreeSet<_> = levels.iter().collect();

    if distinct.len() == 1 {
        return AggregatePattern::Uniform;
    }

    let diffs: Vec<f64> = window_crest_db.windows(2).map(|w| w[1] - w[0]).collect();
    let all_non_increasing = diffs.iter().all(|d| *d <= 0.5);
    let all_non_decreasing = diffs.iter().all(|d| *d >= -0.5);

    if all_non_increasing && !all_non_decreasing {
        return AggregatePattern::Escalating;
    }
    if all_non_decreasing && !all_non_increasing {
        return AggregatePattern::DeEscalating;
    }

    if distinct.len() == 2 {
        let sign_changes = diffs
            .windows(2)
            .filter(|w| w[0].signum() != w[1].signum() && w[0] != 0.0 && w[1] != 0.0)
            .count();
        if sign_changes >= 2 {
            return AggregatePattern::VerseChorusVariance;
        }
    }

    AggregatePattern::Dynamic
}

/// Inputs to [`classify_gain_reduction`].
#[derive(Debug, Clone)]
pub struct GainReductionMetrics {
    /// Per-window crest factor, in dB, in chronological order.
    pub window_crest_db: Vec<f64>,
}

/// Result of classifying the gain-reduction pattern over a full track.
#[derive(Debug, Clone)]
pub struct GainReductionClassification {
    /// Overall (worst-observed) window intensity.
    pub peak_intensity: WindowIntensity,
    /// How intensity evolves over time.
    pub pattern: AggregatePattern,
}

/// Pure classification over per-window crest factors.
pub fn classify_gain_reduction(metrics: &GainReductionMetrics) -> Option<GainReductionClassification> {
    if metrics.window_crest_db.is_empty() {
        return None;
    }
    let peak_intensity = metrics
        .window_crest_db
        .iter()
        .copied()
        .map(classify_window)
        .max()
        .unwrap();
    let pattern = classify_aggregate(&metrics.window_crest_db);
    Some(GainReductionClassification {
        peak_intensity,
        pattern,
    })
}

fn build_report(metrics: &GainReductionMetrics, confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_gain_reduction(metrics) else {
        return super::neutral_report(NEUTRAL_STATUS, "no windows measured");
    };

    let mut recommendations = Vec::new();
    if matches!(c.peak_intensity, WindowIntensity::Heavy | WindowIntensity::Extreme) {
        recommendations.push("revisit bus compression, dynamics are heavily reduced".to_string());
    }

    AnalyzerReport {
        status: c.peak_intensity.as_str().to_string(),
        score: None,
        measurements: serde_json::json!({
            "peakIntensity": c.peak_intensity.as_str(),
            "pattern": c.pattern.as_str(),
            "windowCount": metrics.window_crest_db.len(),
        }),
        description: format!(
            "peak intensity {}, pattern {}",
            c.peak_intensity.as_str(),
            c.pattern.as_str()
        ),
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The gain reduction pattern analyzer.
pub struct GainReductionAnalyzer {
    invoker: Invoker,
}

impl GainReductionAnalyzer {
    /// Build an analyzer using `options` for the external-tool invocation.
    pub fn new(options: &AnalyzerOptions) -> Self {
        Self {
            invoker: Invoker::new(
                options.tool_path.clone(),
                std::time::Duration::from_secs(options.timeout_secs),
            ),
        }
    }
}

#[async_trait]
impl Analyzer for GainReductionAnalyzer {
    type Metrics = GainReductionMetrics;

    async fn analyze(&self, path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        let args = vec![
            "-i".to_string(),
            path.display().to_string(),
            "-af".to_string(),
            "astats=metadata=1:length=5".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let schema = MetricSchema::default_astats_ebur128();
        match self.invoker.measure(&args, &schema).await {
            Ok(m) => {
                let window_crest_db = m
                    .metrics
                    .get("crest_factor")
                    .copied()
                    .flatten()
                    .into_iter()
                    .collect::<Vec<_>>();
                Ok(build_report(&GainReductionMetrics { window_crest_db }, 1.0))
            }
            Err(e) => {
                log::warn!("gain reduction measurement failed for {}: {e}", path.display());
                Ok(super::neutral_report(NEUTRAL_STATUS, e.to_string()))
            }
        }
    }

    fn quick_check(&self, _path: &Path) -> SonarGateResult<CompactReport> {
        Ok(CompactReport {
            status: NEUTRAL_STATUS.to_string(),
            score: None,
        })
    }

    fn classify(&self, metrics: &GainReductionMetrics) -> AnalyzerReport {
        build_report(metrics, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_window_is_none() {
        assert_eq!(classify_window(18.0), WindowIntensity::None);
    }

    #[test]
    fn collapsed_window_is_extreme() {
        assert_eq!(classify_window(2.0), WindowIntensity::Extreme);
    }

    #[test]
    fn uniform_windows_are_uniform() {
        let pattern = classify_aggregate(&[15.5, 15.6, 15.4, 15.5]);
        assert_eq!(pattern, AggregatePattern::Uniform);
    }

    #[test]
    fn steadily_dropping_crest_is_escalating() {
        let pattern = classify_aggregate(&[16.0, 13.0, 9.0, 5.0]);
        assert_eq!(pattern, AggregatePattern::Escalating);
    }

    #[test]
    fn alternating_two_levels_is_verse_chorus_variance() {
        let pattern = classify_aggregate(&[16.0, 8.0, 16.0, 8.0]);
        assert_eq!(pattern, AggregatePattern::VerseChorusVariance);
    }

    #[test]
    fn fewer_than_three_windows_is_sparse() {
        assert_eq!(classify_aggregate(&[16.0, 8.0]), AggregatePattern::Sparse);
    }

    #[test]
    fn empty_windows_is_neutral() {
        let metrics = GainReductionMetrics { window_crest_db: vec![] };
        let report = build_report(&metrics, 0.0);
        assert_eq!(report.status, NEUTRAL_STATUS);
    }
}
