//! Loudness Analyzer: BS.1770/EBU R128-style loudness
//! compliance against a per-platform target, with gain recommendation and
//! true-peak limiter guidance.

use std::path::Path;

use async_trait::async_trait;

use super::platform_targets::{self, PlatformLoudnessTarget};
use super::{Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::invoker::{schema::MetricSchema, Invoker};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when loudness could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";
/// Tolerance (in LU) around a platform's target before a track is flagged.
const COMPLIANCE_TOLERANCE: f64 = 1.0;
/// Offset magnitude beyond which the classifier calls the deviation out as
/// significant in its recommendation text, even though the bucket itself
/// (TOO_LOUD/TOO_QUIET) doesn't change until it exceeds [`SEVERE_OFFSET`].
const SEVERE_OFFSET: f64 = 6.0;
/// dBTP ceiling above which a limiter is recommended post-gain.
const LIMITER_CEILING_DBTP: f64 = -1.0;

/// Loudness compliance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoudnessStatus {
    /// Within tolerance of the platform target.
    Compliant,
    /// Quieter than target, within the non-severe range.
    TooQuiet,
    /// Louder than target, within the non-severe range.
    TooLoud,
    /// Substantially quieter than target.
    SignificantlyTooQuiet,
    /// Substantially louder than target.
    SignificantlyTooLoud,
}

impl LoudnessStatus {
    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            LoudnessStatus::Compliant => Severity::None,
            LoudnessStatus::TooQuiet | LoudnessStatus::TooLoud => Severity::Moderate,
            LoudnessStatus::SignificantlyTooQuiet | LoudnessStatus::SignificantlyTooLoud => {
                Severity::High
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LoudnessStatus::Compliant => "COMPLIANT",
            LoudnessStatus::TooQuiet => "TOO_QUIET",
            LoudnessStatus::TooLoud => "TOO_LOUD",
            LoudnessStatus::SignificantlyTooQuiet => "SIGNIFICANTLY_TOO_QUIET",
            LoudnessStatus::SignificantlyTooLoud => "SIGNIFICANTLY_TOO_LOUD",
        }
    }
}

/// Inputs to [`classify`].
#[derive(Debug, Clone)]
pub struct LoudnessMetrics {
    /// Integrated (program) loudness, in LUFS.
    pub integrated: Option<f64>,
    /// True peak, in dBTP.
    pub true_peak: Option<f64>,
    /// Sample peak, in dBFS.
    pub sample_peak: Option<f64>,
    /// Loudness range, in LU.
    pub lra: Option<f64>,
    /// Target platform name (looked up in [`platform_targets`]).
    pub platform: String,
}

/// Result of classifying loudness against a platform target.
#[derive(Debug, Clone)]
pub struct LoudnessClassification {
    /// Compliance bucket.
    pub status: LoudnessStatus,
    /// Whether the true peak is already safely below the limiter ceiling.
    pub true_peak_ok: bool,
    /// Recommended gain change, in dB, to reach the platform target.
    pub gain_db: f64,
    /// Whether a true-peak limiter is recommended after applying `gain_db`.
    pub needs_limiter: bool,
    /// Predicted effective playback loudness once the platform applies its
    /// own normalization.
    pub predicted_playback_lufs: f64,
}

/// Pure classification, no I/O. `platform` defaults to Spotify's target if
/// unrecognized.
pub fn classify_loudness(metrics: &LoudnessMetrics) -> Option<LoudnessClassification> {
    let integrated = metrics.integrated?;
    let target = platform_targets::find(&metrics.platform)
        .copied()
        .unwrap_or(PlatformLoudnessTarget {
            name: "generic",
            target_lufs: -14.0,
            mode: platform_targets::LoudnessMode::DownOnly,
        });

    let offset = integrated - target.target_lufs;
    let status = if offset.abs() <= COMPLIANCE_TOLERANCE {
        LoudnessStatus::Compliant
    } else if offset > COMPLIANCE_TOLERANCE {
        if offset > SEVERE_OFFSET {
            LoudnessStatus::SignificantlyTooLoud
        } else {
            LoudnessStatus::TooLoud
        }
    } else if offset < -SEVERE_OFFSET {
        LoudnessStatus::SignificantlyTooQuiet
    } else {
        LoudnessStatus::TooQuiet
    };

    let gain_db = -offset;
    let true_peak_ok = metrics.true_peak.map(|tp| tp <= LIMITER_CEILING_DBTP).unwrap_or(false);
    let needs_limiter = metrics
        .true_peak
        .map(|tp| tp + gain_db > LIMITER_CEILING_DBTP)
        .unwrap_or(true);
    let predicted_playback_lufs = platform_targets::predict_playback(integrated, &target);

    Some(LoudnessClassification {
        status,
        true_peak_ok,
        gain_db,
        needs_limiter,
        predicted_playback_lufs,
    })
}

fn build_report(metrics: &LoudnessMetrics, confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_loudness(metrics) else {
        return super::neutral_report(NEUTRAL_STATUS, "integrated loudness not measured");
    };

    let mut recommendations = Vec::new();
    if c.gain_db.abs() > f64::EPSILON {
        recommendations.push(format!("apply {:+.1} dB gain to reach platform target", c.gain_db));
    }
    if c.needs_limiter {
        recommendations.push(format!(
            "true-peak limiter recommended, ceiling {LIMITER_CEILING_DBTP:.1} dBTP"
        ));
    }
    let mut description = format!(
        "{} vs {} target ({:+.1} dB offset)",
        metrics.integrated.unwrap_or(0.0),
        metrics.platform,
        -c.gain_db
    );
    if matches!(
        c.status,
        LoudnessStatus::TooLoud | LoudnessStatus::SignificantlyTooLoud
    ) && c.gain_db <= -SEVERE_OFFSET
    {
        description.push_str(": significantly above target");
    }

    AnalyzerReport {
        status: c.status.as_str().to_string(),
        score: Some((100.0 - c.gain_db.abs() * 5.0).clamp(0.0, 100.0)),
        measurements: serde_json::json!({
            "integrated": metrics.integrated,
            "truePeak": metrics.true_peak,
            "samplePeak": metrics.sample_peak,
            "lra": metrics.lra,
            "gainDb": c.gain_db,
            "truePeakOk": c.true_peak_ok,
            "needsLimiter": c.needs_limiter,
            "predictedPlaybackLufs": c.predicted_playback_lufs,
        }),
        description,
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The loudness analyzer.
pub struct LoudnessAnalyzer {
    invoker: Invoker,
}

impl LoudnessAnalyzer {
    /// Build an analyzer targeting `platform`, using `options` for the
    /// external-tool invocation.
    pub fn new(options: &AnalyzerOptions) -> Self {
        Self {
            invoker: Invoker::new(options.tool_path.clone(), std::time::Duration::from_secs(options.timeout_secs)),
        }
    }
}

#[async_trait]
impl Analyzer for LoudnessAnalyzer {
    type Metrics = LoudnessMetrics;

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
                &LoudnessMetrics {
                    integrated: m.metrics.get("integrated_loudness").copied().flatten(),
                    true_peak: m.metrics.get("true_peak").copied().flatten(),
                    sample_peak: m.metrics.get("peak_level_db").copied().flatten(),
                    lra: m.metrics.get("loudness_range").copied().flatten(),
                    platform: "spotify".to_string(),
                },
                1.0,
            )),
            Err(e) => {
                log::warn!("loudness measurement failed for {}: {e}", path.display());
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

    fn classify(&self, metrics: &LoudnessMetrics) -> AnalyzerReport {
        build_report(metrics, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_streaming_master_is_compliant() {
        let metrics = LoudnessMetrics {
            integrated: Some(-14.1),
            true_peak: Some(-1.2),
            sample_peak: None,
            lra: Some(7.0),
            platform: "spotify".to_string(),
        };
        let c = classify_loudness(&metrics).unwrap();
        assert_eq!(c.status, LoudnessStatus::Compliant);
        assert!(c.true_peak_ok);
        assert!((c.gain_db - 0.1).abs() < 1e-9);
        assert!(!c.needs_limiter);
    }

    #[test]
    fn hot_master_is_too_loud_with_down_only_prediction() {
        let metrics = LoudnessMetrics {
            integrated: Some(-8.0),
            true_peak: Some(-0.2),
            sample_peak: None,
            lra: None,
            platform: "spotify".to_string(),
        };
        let c = classify_loudness(&metrics).unwrap();
        assert_eq!(c.status, LoudnessStatus::TooLoud);
        assert!((c.gain_db - -6.0).abs() < 1e-9);
        assert_eq!(c.predicted_playback_lufs, -14.0);

        let report = build_report(&metrics, 1.0);
        assert!(report.description.contains("significantly above target"));
    }

    #[test]
    fn missing_integrated_is_neutral() {
        let metrics = LoudnessMetrics {
            integrated: None,
            true_peak: None,
            sample_peak: None,
            lra: None,
            platform: "spotify".to_string(),
        };
        let report = build_report(&metrics, 0.0);
        assert_eq!(report.status, NEUTRAL_STATUS);
        assert_eq!(report.confidence, 0.0);
    }
}
