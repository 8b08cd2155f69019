//! Intersample Peak Risk analyzer: measures sample peak
//! and true peak independently, and projects overshoot after a lossy
//! re-encode using a table of per-codec add-ons.

use std::path::Path;

use async_trait::async_trait;

use super::{Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::invoker::{schema::MetricSchema, Invoker};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when peaks could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";

/// Per-codec post-encode true-peak overshoot add-on, in dB.
pub const CODEC_OVERSHOOT_TABLE: &[(&str, f64)] = &[
    ("mp3_128", 0.8),
    ("mp3_320", 0.4),
    ("aac_256", 0.2),
    ("aac_128", 0.5),
    ("opus_160", 0.3),
];

/// Look up the projected add-on for a codec/bitrate profile; `0.0` if
/// unknown (no projection possible, not "no overshoot").
pub fn codec_overshoot(profile: &str) -> f64 {
    CODEC_OVERSHOOT_TABLE
        .iter()
        .find(|(name, _)| *name == profile)
        .map(|(_, db)| *db)
        .unwrap_or(0.0)
}

/// Intersample peak risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakStatus {
    /// No meaningful intersample risk.
    Safe,
    /// Minor risk; worth a closer look.
    Marginal,
    /// True peak clearly exceeds the sample peak by a risky margin.
    Exceeds,
    /// Clips or nearly clips after any further gain.
    Critical,
}

impl PeakStatus {
    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            PeakStatus::Safe => Severity::None,
            PeakStatus::Marginal => Severity::Low,
            PeakStatus::Exceeds => Severity::High,
            PeakStatus::Critical => Severity::Critical,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PeakStatus::Safe => "SAFE",
            PeakStatus::Marginal => "MARGINAL",
            PeakStatus::Exceeds => "EXCEEDS",
            PeakStatus::Critical => "CRITICAL",
        }
    }
}

/// Inputs to [`classify_peaks`].
#[derive(Debug, Clone)]
pub struct PeakMetrics {
    /// Sample (digital) peak, in dBFS.
    pub sample_peak: Option<f64>,
    /// True (oversampled) peak, in dBTP.
    pub true_peak: Option<f64>,
}

/// Result of classifying intersample peak risk. `overshoot` is always
/// `max(0, truePeak - samplePeak)`.
#[derive(Debug, Clone)]
pub struct PeakClassification {
    /// Classified status.
    pub status: PeakStatus,
    /// `max(0, truePeak - samplePeak)`, in dB.
    pub overshoot: f64,
}

/// Pure classification, no I/O. Evaluated in priority order (critical
/// first) since the rule set has overlapping conditions.
pub fn classify_peaks(metrics: &PeakMetrics) -> Option<PeakClassification> {
    let sample_peak = metrics.sample_peak?;
    let true_peak = metrics.true_peak?;
    let overshoot = (true_peak - sample_peak).max(0.0);

    let status = if true_peak > 0.0 || (true_peak > -1.0 && overshoot > 1.5) {
        PeakStatus::Critical
    } else if overshoot < 0.3 && true_peak <= -2.0 {
        PeakStatus::Safe
    } else if overshoot <= 0.8 || true_peak > -1.0 {
        PeakStatus::Marginal
    } else {
        PeakStatus::Exceeds
    };

    Some(PeakClassification { status, overshoot })
}

fn build_report(metrics: &PeakMetrics, confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_peaks(metrics) else {
        return super::neutral_report(NEUTRAL_STATUS, "sample/true peak not measured");
    };

    let mut recommendations = Vec::new();
    if matches!(c.status, PeakStatus::Exceeds | PeakStatus::Critical) {
        recommendations.push("apply a -1.0 dBTP true-peak limiter before export".to_string());
    }

    AnalyzerReport {
        status: c.status.as_str().to_string(),
        score: Some((100.0 - c.overshoot * 40.0).clamp(0.0, 100.0)),
        measurements: serde_json::json!({
            "samplePeak": metrics.sample_peak,
            "truePeak": metrics.true_peak,
            "overshoot": c.overshoot,
        }),
        description: format!(
            "overshoot {:.2} dB (sample peak {:.2} dBFS, true peak {:.2} dBTP)",
            c.overshoot,
            metrics.sample_peak.unwrap_or(0.0),
            metrics.true_peak.unwrap_or(0.0)
        ),
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The intersample peak risk analyzer.
pub struct IntersamplePeakAnalyzer {
    invoker: Invoker,
}

impl IntersamplePeakAnalyzer {
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
impl Analyzer for IntersamplePeakAnalyzer {
    type Metrics = PeakMetrics;

    async fn analyze(&self, path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        let args = vec![
            "-i".to_string(),
            path.display().to_string(),
            "-af".to_string(),
            "ebur128=metadata=1:peak=true".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let schema = MetricSchema::default_astats_ebur128();
        match self.invoker.measure(&args, &schema).await {
            Ok(m) => Ok(build_report(
                &PeakMetrics {
                    sample_peak: m.metrics.get("peak_level_db").copied().flatten(),
                    true_peak: m.metrics.get("true_peak").copied().flatten(),
                },
                1.0,
            )),
            Err(e) => {
                log::warn!("peak measurement failed for {}: {e}", path.display());
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

    fn classify(&self, metrics: &PeakMetrics) -> AnalyzerReport {
        build_report(metrics, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersample_overshoot_above_zero_true_peak_is_critical() {
        let metrics = PeakMetrics {
            sample_peak: Some(-0.5),
            true_peak: Some(0.4),
        };
        let c = classify_peaks(&metrics).unwrap();
        assert!((c.overshoot - 0.9).abs() < 1e-9);
        assert_eq!(c.status, PeakStatus::Critical);

        let report = build_report(&metrics, 1.0);
        assert!(report.recommendations.iter().any(|r| r.contains("-1.0 dBTP")));
    }

    #[test]
    fn deeply_safe_master_is_safe() {
        let metrics = PeakMetrics {
            sample_peak: Some(-6.0),
            true_peak: Some(-5.8),
        };
        let c = classify_peaks(&metrics).unwrap();
        assert_eq!(c.status, PeakStatus::Safe);
    }

    #[test]
    fn codec_overshoot_table_lookup() {
        assert_eq!(codec_overshoot("mp3_128"), 0.8);
        assert_eq!(codec_overshoot("aac_256"), 0.2);
        assert_eq!(codec_overshoot("unknown_codec"), 0.0);
    }
}
