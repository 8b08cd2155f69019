//! ReplayGain analyzer: track-gain calculation against
//! the ReplayGain 2.0 reference (-18 LUFS), Apple Sound Check scaling, and
//! per-platform predicted playback using the shared loudness target table.

use std::path::Path;

use async_trait::async_trait;

use super::platform_targets::{self, PlatformLoudnessTarget};
use super::{Analyzer, AnalyzerOptions, CompactReport};
use crate::core::invoker::{schema::MetricSchema, Invoker};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when integrated loudness could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";
/// ReplayGain 2.0 reference level, in LUFS.
pub const REPLAYGAIN_REFERENCE_LUFS: f64 = -18.0;
/// Apple Sound Check reference level, in LUFS (approximates iTunes
/// normalization target).
pub const SOUND_CHECK_REFERENCE_LUFS: f64 = -16.0;

/// Inputs to [`classify_replaygain`].
#[derive(Debug, Clone)]
pub struct ReplayGainMetrics {
    /// Integrated loudness, in LUFS.
    pub integrated: Option<f64>,
    /// True peak, in dBTP (used to clamp gain so the peak won't clip).
    pub true_peak: Option<f64>,
}

/// Computed gain values and predictions.
#[derive(Debug, Clone)]
pub struct ReplayGainClassification {
    /// ReplayGain 2.0 track gain, in dB.
    pub track_gain_db: f64,
    /// Track gain after clamping so `true_peak + gain <= 0` dBTP.
    pub clip_safe_gain_db: f64,
    /// Whether the unclamped gain would have clipped.
    pub clip_prevented: bool,
    /// Apple Sound Check gain, in dB.
    pub sound_check_gain_db: f64,
    /// Predicted playback loudness per platform name.
    pub predicted_playback: Vec<(String, f64)>,
    /// Mean of predicted-playback values across `predicted_playback`,
    /// i.e. the multi-platform loudness sweet spot.
    pub sweet_spot_lufs: f64,
}

/// Pure classification.
pub fn classify_replaygain(metrics: &ReplayGainMetrics, platforms: &[&str]) -> Option<ReplayGainClassification> {
    let integrated = metrics.integrated?;

    let track_gain_db = REPLAYGAIN_REFERENCE_LUFS - integrated;
    let sound_check_gain_db = SOUND_CHECK_REFERENCE_LUFS - integrated;

    let (clip_safe_gain_db, clip_prevented) = match metrics.true_peak {
        Some(true_peak) if true_peak + track_gain_db > 0.0 => (-true_peak, true),
        _ => (track_gain_db, false),
    };

    let targets: Vec<&'static PlatformLoudnessTarget> = platforms
        .iter()
        .filter_map(|p| platform_targets::find(p))
        .collect();
    let predicted_playback: Vec<(String, f64)> = targets
        .iter()
        .map(|t| (t.name.to_string(), platform_targets::predict_playback(integrated, t)))
        .collect();
    let sweet_spot_lufs = platform_targets::sweet_spot(integrated, &targets);

    Some(ReplayGainClassification {
        track_gain_db,
        clip_safe_gain_db,
        clip_prevented,
        sound_check_gain_db,
        predicted_playback,
        sweet_spot_lufs,
    })
}

fn build_report(metrics: &ReplayGainMetrics, platforms: &[&str], confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_replaygain(metrics, platforms) else {
        return super::neutral_report(NEUTRAL_STATUS, "integrated loudness not measured");
    };

    let mut recommendations = Vec::new();
    if c.clip_prevented {
        recommendations.push("ReplayGain clamped to avoid clipping; consider a true-peak limiter instead".to_string());
    }

    AnalyzerReport {
        status: "COMPUTED".to_string(),
        score: None,
        measurements: serde_json::json!({
            "trackGainDb": c.track_gain_db,
            "clipSafeGainDb": c.clip_safe_gain_db,
            "clipPrevented": c.clip_prevented,
            "soundCheckGainDb": c.sound_check_gain_db,
            "predictedPlayback": c.predicted_playback,
            "sweetSpotLufs": c.sweet_spot_lufs,
        }),
        description: format!(
            "track gain {:+.1} dB (ref {:.0} LUFS), sweet spot {:.1} LUFS",
            c.clip_safe_gain_db, REPLAYGAIN_REFERENCE_LUFS, c.sweet_spot_lufs
        ),
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The ReplayGain analyzer.
pub struct ReplayGainAnalyzer {
    invoker: Invoker,
    platforms: Vec<String>,
}

impl ReplayGainAnalyzer {
    /// Build an analyzer using `options` for the external-tool invocation,
    /// predicting playback across `platforms`.
    pub fn new(options: &AnalyzerOptions, platforms: Vec<String>) -> Self {
        Self {
            invoker: Invoker::new(
                options.tool_path.clone(),
                std::time::Duration::from_secs(options.timeout_secs),
            ),
            platforms,
        }
    }
}

#[async_trait]
impl Analyzer for ReplayGainAnalyzer {
    type Metrics = ReplayGainMetrics;

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
        let platform_refs: Vec<&str> = self.platforms.iter().map(String::as_str).collect();
        match self.invoker.measure(&args, &schema).await {
            Ok(m) => Ok(build_report(
                &ReplayGainMetrics {
                    integrated: m.metrics.get("integrated_loudness").copied().flatten(),
                    true_peak: m.metrics.get("true_peak").copied().flatten(),
                },
                &platform_refs,
                1.0,
            )),
            Err(e) => {
                log::warn!("replaygain measurement failed for {}: {e}", path.display());
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

    fn classify(&self, metrics: &ReplayGainMetrics) -> AnalyzerReport {
        let platform_refs: Vec<&str> = self.platforms.iter().map(String::as_str).collect();
        build_report(metrics, &platform_refs, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_track_gets_positive_gain() {
        let metrics = ReplayGainMetrics {
            integrated: Some(-23.0),
            true_peak: Some(-5.0),
        };
        let c = classify_replaygain(&metrics, &["spotify"]).unwrap();
        assert!((c.track_gain_db - 5.0).abs() < 1e-9);
        assert!(!c.clip_prevented);
    }

    #[test]
    fn hot_true_peak_clamps_gain_to_avoid_clipping() {
        let metrics = ReplayGainMetrics {
            integrated: Some(-20.0),
            true_peak: Some(-1.0),
        };
        let c = classify_replaygain(&metrics, &[]).unwrap();
        assert!(c.clip_prevented);
        assert!((c.clip_safe_gain_db - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sweet_spot_averages_selected_platforms() {
        let metrics = ReplayGainMetrics {
            integrated: Some(-14.0),
            true_peak: Some(-1.0),
        };
        let c = classify_replaygain(&metrics, &["spotify", "apple_music"]).unwrap();
        assert!((c.sweet_spot_lufs - -15.0).abs() < 1e-9);
    }

    #[test]
    fn missing_integrated_is_neutral() {
        let metrics = ReplayGainMetrics {
            integrated: None,
            true_peak: None,
        };
        let report = build_report(&metrics, &[], 0.0);
        assert_eq!(report.status, NEUTRAL_STATUS);
    }
}
