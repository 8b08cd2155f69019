//! Clipping Source analyzer: classifies whether detected clipping looks
//! like it was baked in upstream (before the source even reached this
//! chain), introduced downstream at export/mastering, or is a soft,
//! sub-ceiling flattening rather than hard digital clipping at all, from
//! flat factor, peak level, and where clipped samples fall across the
//! file's timeline.

use std::path::Path;

use async_trait::async_trait;

use super::{dsp, Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::invoker::{schema::MetricSchema, Invoker};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when clip statistics could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";
/// Clip density below which a track is considered unclipped.
const CLIP_DENSITY_FLOOR: f64 = 0.0001;
/// Flat factor at/above which, combined with a ceiling-level peak, the
/// waveform is hard-clipped rather than merely flattened.
const HARD_CLIP_FLAT_FACTOR_FLOOR: f64 = 0.3;
/// Flat factor at/above which mid-range flattening (without a ceiling
/// peak) is called soft clipping rather than left undetermined.
const SOFT_CLIP_FLAT_FACTOR_FLOOR: f64 = 0.15;
/// Peak level (dBFS) at/above which (i.e. less negative than) a track is
/// considered to be riding the digital ceiling.
const CEILING_PEAK_DB: f64 = -0.1;
/// Linear amplitude treated as "at the ceiling" when scanning decoded
/// samples for the temporal-distribution timeline.
const CLIP_CEILING_AMPLITUDE: f32 = 0.999;
/// Max spread between a third's share of clipped samples and the others'
/// before the distribution is no longer called "even".
const THIRDS_EVENNESS_TOLERANCE: f64 = 0.15;
/// Share of clipped samples a single third must hold, and be the largest
/// of the three, to count as "concentrated" there.
const THIRDS_CONCENTRATION_FLOOR: f64 = 0.5;

/// Source classification for detected clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSource {
    /// No clipping detected.
    None,
    /// Mid-range flattening well short of the digital ceiling; not hard
    /// clipping.
    SoftClip,
    /// Consistent with clipping already present in the source material:
    /// hard clipping spread evenly across the whole file.
    Upstream,
    /// Consistent with clipping introduced at this stage's export/limiter:
    /// hard clipping concentrated toward the end of the file.
    Downstream,
    /// Hard clipping scattered with no single dominant region.
    Mixed,
    /// Clipping detected but the source could not be localized.
    Undetermined,
}

impl ClipSource {
    fn as_str(self) -> &'static str {
        match self {
            ClipSource::None => "NONE",
            ClipSource::SoftClip => "SOFT_CLIP",
            ClipSource::Upstream => "UPSTREAM",
            ClipSource::Downstream => "DOWNSTREAM",
            ClipSource::Mixed => "MIXED",
            ClipSource::Undetermined => "UNDETERMINED",
        }
    }
}

/// Severity bucket, driven purely by clip density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSeverity {
    /// No clipping.
    None,
    /// Isolated, likely inaudible.
    Low,
    /// Audible but limited in extent.
    Moderate,
    /// Clearly audible.
    High,
    /// Pervasive.
    Critical,
}

impl ClipSeverity {
    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            ClipSeverity::None => Severity::None,
            ClipSeverity::Low => Severity::Low,
            ClipSeverity::Moderate => Severity::Moderate,
            ClipSeverity::High => Severity::High,
            ClipSeverity::Critical => Severity::Critical,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ClipSeverity::None => "NONE",
            ClipSeverity::Low => "LOW",
            ClipSeverity::Moderate => "MODERATE",
            ClipSeverity::High => "HIGH",
            ClipSeverity::Critical => "CRITICAL",
        }
    }

    /// Severity from clip density alone, e.g. `0.05% -> MODERATE`.
    fn from_density(clip_density: f64) -> Self {
        if clip_density < CLIP_DENSITY_FLOOR {
            ClipSeverity::None
        } else if clip_density < 0.0005 {
            ClipSeverity::Low
        } else if clip_density < 0.001 {
            ClipSeverity::Moderate
        } else if clip_density < 0.01 {
            ClipSeverity::High
        } else {
            ClipSeverity::Critical
        }
    }
}

/// How clipped samples are spread across a windowed timeline split into
/// thirds (start, middle, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThirdsDistribution {
    /// Roughly equal share in every third.
    Even,
    /// Clearly dominant in the last third.
    ConcentratedLast,
    /// Clearly dominant in the first third.
    ConcentratedFirst,
    /// No third dominates, but it's not even either.
    Scattered,
}

fn classify_thirds(thirds: [u64; 3]) -> ThirdsDistribution {
    let total = thirds.iter().sum::<u64>();
    if total == 0 {
        return ThirdsDistribution::Scattered;
    }
    let fractions: Vec<f64> = thirds.iter().map(|&c| c as f64 / total as f64).collect();
    let max = fractions.iter().cloned().fold(f64::MIN, f64::max);
    let min = fractions.iter().cloned().fold(f64::MAX, f64::min);

    if max - min <= THIRDS_EVENNESS_TOLERANCE {
        return ThirdsDistribution::Even;
    }
    if fractions[2] >= THIRDS_CONCENTRATION_FLOOR && fractions[2] == max {
        return ThirdsDistribution::ConcentratedLast;
    }
    if fractions[0] >= THIRDS_CONCENTRATION_FLOOR && fractions[0] == max {
        return ThirdsDistribution::ConcentratedFirst;
    }
    ThirdsDistribution::Scattered
}

/// Inputs to [`classify_clipping`].
#[derive(Debug, Clone)]
pub struct ClipMetrics {
    /// Fraction of samples at or beyond full scale, over the whole file.
    pub clip_density: Option<f64>,
    /// Flat factor: proportion of consecutive equal-valued samples at
    /// peak, a proxy for hard-limited/clipped runs.
    pub flat_factor: Option<f64>,
    /// Peak level, in dBFS.
    pub peak_db: Option<f64>,
    /// Count of clipped samples falling in each third (start, middle, end)
    /// of the decoded timeline, when in-process sample access was
    /// available.
    pub thirds: Option<[u64; 3]>,
}

/// Result of classifying a track's clipping.
#[derive(Debug, Clone)]
pub struct ClipClassification {
    /// Source classification.
    pub source: ClipSource,
    /// Severity, from clip density alone.
    pub severity: ClipSeverity,
    /// The temporal distribution that drove `source`, when one was
    /// available (hard clipping only; `None` for `NONE`/`SOFT_CLIP` or
    /// when no timeline was measured).
    distribution: Option<ThirdsDistribution>,
}

impl ClipClassification {
    /// Whether the clip timeline was judged evenly spread (only
    /// meaningful for `Upstream`).
    pub fn distribution_even(&self) -> bool {
        matches!(self.distribution, Some(ThirdsDistribution::Even))
    }
}

/// Pure classification, no I/O. `NONE` when density is negligible;
/// `SOFT_CLIP` for mid-range flattening that never reaches the digital
/// ceiling; otherwise hard clipping, whose source is read off the
/// thirds-based temporal distribution of clipped samples.
pub fn classify_clipping(metrics: &ClipMetrics) -> Option<ClipClassification> {
    let clip_density = metrics.clip_density?;
    let severity = ClipSeverity::from_density(clip_density);

    if matches!(severity, ClipSeverity::None) {
        return Some(ClipClassification {
            source: ClipSource::None,
            severity,
            distribution: None,
        });
    }

    let at_ceiling = metrics.peak_db.map(|p| p >= CEILING_PEAK_DB).unwrap_or(false);
    let very_high_flat_factor = metrics.flat_factor.map(|f| f >= HARD_CLIP_FLAT_FACTOR_FLOOR).unwrap_or(false);
    let hard_clip = at_ceiling || very_high_flat_factor;

    if !hard_clip {
        let mid_range_flat_factor = metrics.flat_factor.map(|f| f >= SOFT_CLIP_FLAT_FACTOR_FLOOR).unwrap_or(false);
        let source = if mid_range_flat_factor {
            ClipSource::SoftClip
        } else {
            ClipSource::Undetermined
        };
        return Some(ClipClassification {
            source,
            severity,
            distribution: None,
        });
    }

    let distribution = metrics.thirds.map(classify_thirds);
    let source = match distribution {
        Some(ThirdsDistribution::Even) => ClipSource::Upstream,
        Some(ThirdsDistribution::ConcentratedLast) => ClipSource::Downstream,
        Some(ThirdsDistribution::ConcentratedFirst) => ClipSource::Undetermined,
        Some(ThirdsDistribution::Scattered) => ClipSource::Mixed,
        None => ClipSource::Undetermined,
    };

    Some(ClipClassification {
        source,
        severity,
        distribution,
    })
}

fn build_report(metrics: &ClipMetrics, confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_clipping(metrics) else {
        return super::neutral_report(NEUTRAL_STATUS, "clip statistics not measured");
    };

    let mut recommendations = Vec::new();
    if matches!(c.severity, ClipSeverity::High | ClipSeverity::Critical) {
        if matches!(c.source, ClipSource::Upstream) {
            recommendations.push("re-render from a pre-clip source if available".to_string());
        } else {
            recommendations.push("lower the limiter ceiling before final export".to_string());
        }
    }

    AnalyzerReport {
        status: c.source.as_str().to_string(),
        score: Some((100.0 - metrics.clip_density.unwrap_or(0.0) * 100_000.0).clamp(0.0, 100.0)),
        measurements: serde_json::json!({
            "clipDensity": metrics.clip_density,
            "flatFactor": metrics.flat_factor,
            "peakDb": metrics.peak_db,
            "thirds": metrics.thirds,
            "severity": c.severity.as_str(),
            "distributionEven": c.distribution_even(),
        }),
        description: format!(
            "source {}, severity {} (clip density {:.5})",
            c.source.as_str(),
            c.severity.as_str(),
            metrics.clip_density.unwrap_or(0.0)
        ),
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The clipping source analyzer.
pub struct ClippingAnalyzer {
    invoker: Invoker,
}

impl ClippingAnalyzer {
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
impl Analyzer for ClippingAnalyzer {
    type Metrics = ClipMetrics;

    async fn analyze(&self, path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        let args = vec![
            "-i".to_string(),
            path.display().to_string(),
            "-af".to_string(),
            "astats=metadata=1".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let schema = MetricSchema::default_astats_ebur128();
        let measured = match self.invoker.measure(&args, &schema).await {
            Ok(m) => m,
            Err(e) => {
                log::warn!("clip measurement failed for {}: {e}", path.display());
                return Ok(super::neutral_report(NEUTRAL_STATUS, e.to_string()));
            }
        };

        let (clip_density, thirds) = match dsp::decode_channels(path) {
            Ok(decoded) => {
                let mono = dsp::to_mono(&decoded.channels);
                let (density, thirds) = dsp::clip_density_and_thirds(&mono, CLIP_CEILING_AMPLITUDE);
                (Some(density), Some(thirds))
            }
            Err(e) => {
                log::warn!("in-process decode failed for {}: {e}", path.display());
                (None, None)
            }
        };

        Ok(build_report(
            &ClipMetrics {
                clip_density,
                flat_factor: measured.metrics.get("flat_factor").copied().flatten(),
                peak_db: measured.metrics.get("peak_level_db").copied().flatten(),
                thirds,
            },
            0.8,
        ))
    }

    fn quick_check(&self, _path: &Path) -> SonarGateResult<CompactReport> {
        Ok(CompactReport {
            status: NEUTRAL_STATUS.to_string(),
            score: None,
        })
    }

    fn classify(&self, metrics: &ClipMetrics) -> AnalyzerReport {
        build_report(metrics, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_clipping_is_none() {
        let metrics = ClipMetrics {
            clip_density: Some(0.0),
            flat_factor: Some(0.0),
            peak_db: Some(-6.0),
            thirds: Some([0, 0, 0]),
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::None);
        assert_eq!(c.severity, ClipSeverity::None);
    }

    #[test]
    fn even_hard_clipping_is_upstream_moderate() {
        let metrics = ClipMetrics {
            clip_density: Some(0.0005),
            flat_factor: Some(0.35),
            peak_db: Some(-0.05),
            thirds: Some([10, 11, 9]),
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::Upstream);
        assert_eq!(c.severity, ClipSeverity::Moderate);
        assert!(c.distribution_even());
    }

    #[test]
    fn hard_clipping_concentrated_at_end_is_downstream() {
        let metrics = ClipMetrics {
            clip_density: Some(0.02),
            flat_factor: Some(0.05),
            peak_db: Some(-0.02),
            thirds: Some([1, 1, 20]),
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::Downstream);
        assert_eq!(c.severity, ClipSeverity::Critical);
    }

    #[test]
    fn hard_clipping_concentrated_at_start_is_undetermined() {
        let metrics = ClipMetrics {
            clip_density: Some(0.02),
            flat_factor: Some(0.35),
            peak_db: Some(-0.02),
            thirds: Some([20, 1, 1]),
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::Undetermined);
    }

    #[test]
    fn hard_clipping_scattered_is_mixed() {
        let metrics = ClipMetrics {
            clip_density: Some(0.02),
            flat_factor: Some(0.35),
            peak_db: Some(-0.02),
            thirds: Some([9, 2, 10]),
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::Mixed);
    }

    #[test]
    fn mid_range_flat_factor_without_ceiling_is_soft_clip() {
        let metrics = ClipMetrics {
            clip_density: Some(0.0002),
            flat_factor: Some(0.2),
            peak_db: Some(-6.0),
            thirds: None,
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::SoftClip);
    }

    #[test]
    fn missing_flat_factor_and_peak_is_undetermined() {
        let metrics = ClipMetrics {
            clip_density: Some(0.0002),
            flat_factor: None,
            peak_db: None,
            thirds: None,
        };
        let c = classify_clipping(&metrics).unwrap();
        assert_eq!(c.source, ClipSource::Undetermined);
    }

    #[test]
    fn missing_density_is_neutral() {
        let metrics = ClipMetrics {
            clip_density: None,
            flat_factor: None,
            peak_db: None,
            thirds: None,
        };
        let report = build_report(&metrics, 0.0);
        assert_eq!(report.status, NEUTRAL_STATUS);
    }
}
