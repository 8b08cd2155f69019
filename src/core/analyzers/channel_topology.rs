//! Channel Topology analyzer: classifies how a multi-
//! channel file actually uses its channels, from inter-channel
//! difference peak/RMS and correlation, rather than trusting the
//! channel count alone.

use std::path::Path;

use async_trait::async_trait;

use super::{dsp, Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when channel statistics could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";
/// Diff-peak ceiling (dBFS) below which left and right are considered
/// identical (dual mono).
const DUAL_MONO_DIFF_PEAK_CEILING_DB: f64 = -80.0;
/// Diff-RMS ceiling (dB) below which left and right are considered
/// identical (dual mono).
const DUAL_MONO_DIFF_RMS_CEILING_DB: f64 = -60.0;
/// Correlation band within which channels are candidates for a mid/side
/// pair rather than conventional stereo.
const MID_SIDE_CORRELATION_BAND: f64 = 0.3;
/// Inter-channel level difference (dB) above which, combined with a low
/// correlation, a pair is classified mid/side.
const MID_SIDE_LEVEL_DIFF_FLOOR_DB: f64 = 10.0;

/// Topology classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Single channel.
    Mono,
    /// Two channels carrying genuinely different (but correlated) signal.
    Stereo,
    /// Two channels carrying identical signal.
    DualMono,
    /// Two channels whose sum/difference look like a mid/side encode.
    MidSide,
    /// More than two channels.
    Multichannel,
}

impl Topology {
    fn as_str(self) -> &'static str {
        match self {
            Topology::Mono => "MONO",
            Topology::Stereo => "STEREO",
            Topology::DualMono => "DUAL_MONO",
            Topology::MidSide => "MID_SIDE",
            Topology::Multichannel => "MULTICHANNEL",
        }
    }

    /// Map to the shared severity ladder. Topology itself isn't a defect;
    /// `DualMono` is the only bucket worth a low-severity flag, since it
    /// usually means stereo width was lost upstream.
    pub fn to_severity(self) -> Severity {
        match self {
            Topology::DualMono => Severity::Low,
            _ => Severity::None,
        }
    }
}

/// Inputs to [`classify_topology`].
#[derive(Debug, Clone)]
pub struct TopologyMetrics {
    /// Channel count.
    pub channel_count: u32,
    /// Peak of `left - right`, in dBFS (stereo files only).
    pub diff_peak_db: Option<f64>,
    /// RMS of `left - right`, in dB relative to full scale (stereo only).
    pub diff_rms_db: Option<f64>,
    /// Pearson correlation between left and right, in `[-1, 1]`.
    pub correlation: Option<f64>,
    /// Absolute level difference between left and right channels, in dB.
    pub level_diff_db: Option<f64>,
}

/// Pure classification, no I/O.
pub fn classify_topology(metrics: &TopologyMetrics) -> Topology {
    if metrics.channel_count <= 1 {
        return Topology::Mono;
    }
    if metrics.channel_count > 2 {
        return Topology::Multichannel;
    }

    let is_dual_mono = metrics.diff_peak_db.map(|p| p < DUAL_MONO_DIFF_PEAK_CEILING_DB).unwrap_or(false)
        || metrics.diff_rms_db.map(|r| r < DUAL_MONO_DIFF_RMS_CEILING_DB).unwrap_or(false);
    if is_dual_mono {
        return Topology::DualMono;
    }

    let is_mid_side = metrics.correlation.map(|c| (-MID_SIDE_CORRELATION_BAND..=MID_SIDE_CORRELATION_BAND).contains(&c)).unwrap_or(false)
        && metrics.level_diff_db.map(|d| d > MID_SIDE_LEVEL_DIFF_FLOOR_DB).unwrap_or(false);
    if is_mid_side {
        return Topology::MidSide;
    }

    Topology::Stereo
}

fn build_report(metrics: &TopologyMetrics) -> AnalyzerReport {
    let topology = classify_topology(metrics);

    let mut recommendations = Vec::new();
    if matches!(topology, Topology::DualMono) {
        recommendations.push("left and right channels are identical; confirm this is intentional".to_string());
    }

    AnalyzerReport {
        status: topology.as_str().to_string(),
        score: None,
        measurements: serde_json::json!({
            "channelCount": metrics.channel_count,
            "diffPeakDb": metrics.diff_peak_db,
            "diffRmsDb": metrics.diff_rms_db,
            "correlation": metrics.correlation,
            "levelDiffDb": metrics.level_diff_db,
        }),
        description: format!("{} channel(s), classified as {}", metrics.channel_count, topology.as_str()),
        recommendations,
        confidence: 1.0,
        analysis_time_ms: 0,
    }
}

/// The channel topology analyzer. Inter-channel stats come from
/// in-process decoded samples, not the external tool; `new` still takes
/// `&AnalyzerOptions` to match the rest of the fan-out.
pub struct ChannelTopologyAnalyzer;

impl ChannelTopologyAnalyzer {
    /// Build the analyzer. `options` is unused (no external-tool call).
    pub fn new(_options: &AnalyzerOptions) -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for ChannelTopologyAnalyzer {
    type Metrics = TopologyMetrics;

    async fn analyze(&self, path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        let decoded = match dsp::decode_channels(path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("channel topology decode failed for {}: {e}", path.display());
                return Ok(super::neutral_report(NEUTRAL_STATUS, e.to_string()));
            }
        };
        let channel_count = decoded.channels.len() as u32;

        let metrics = if channel_count == 2 {
            let left = &decoded.channels[0];
            let right = &decoded.channels[1];
            let diff: Vec<f32> = left.iter().zip(right.iter()).map(|(l, r)| l - r).collect();
            let rms_left = dsp::rms(left);
            let rms_right = dsp::rms(right);
            TopologyMetrics {
                channel_count,
                diff_peak_db: Some(dsp::to_db(dsp::peak_abs(&diff))),
                diff_rms_db: Some(dsp::to_db(dsp::rms(&diff))),
                correlation: Some(dsp::correlation(left, right)),
                level_diff_db: Some((dsp::to_db(rms_left) - dsp::to_db(rms_right)).abs()),
            }
        } else {
            TopologyMetrics {
                channel_count,
                diff_peak_db: None,
                diff_rms_db: None,
                correlation: None,
                level_diff_db: None,
            }
        };

        Ok(build_report(&metrics))
    }

    fn quick_check(&self, _path: &Path) -> SonarGateResult<CompactReport> {
        Ok(CompactReport {
            status: NEUTRAL_STATUS.to_string(),
            score: None,
        })
    }

    fn classify(&self, metrics: &TopologyMetrics) -> AnalyzerReport {
        build_report(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_channel_is_mono() {
        let metrics = TopologyMetrics {
            channel_count: 1,
            diff_peak_db: None,
            diff_rms_db: None,
            correlation: None,
            level_diff_db: None,
        };
        assert_eq!(classify_topology(&metrics), Topology::Mono);
    }

    #[test]
    fn five_channels_is_multichannel() {
        let metrics = TopologyMetrics {
            channel_count: 6,
            diff_peak_db: None,
            diff_rms_db: None,
            correlation: Some(0.5),
            level_diff_db: None,
        };
        assert_eq!(classify_topology(&metrics), Topology::Multichannel);
    }

    #[test]
    fn identical_channels_are_dual_mono() {
        let metrics = TopologyMetrics {
            channel_count: 2,
            diff_peak_db: Some(-92.0),
            diff_rms_db: Some(-80.0),
            correlation: Some(0.9999),
            level_diff_db: Some(0.0),
        };
        assert_eq!(classify_topology(&metrics), Topology::DualMono);
    }

    #[test]
    fn low_correlation_with_level_difference_is_mid_side() {
        let metrics = TopologyMetrics {
            channel_count: 2,
            diff_peak_db: Some(-3.0),
            diff_rms_db: Some(-6.0),
            correlation: Some(0.05),
            level_diff_db: Some(12.0),
        };
        assert_eq!(classify_topology(&metrics), Topology::MidSide);
    }

    #[test]
    fn low_correlation_without_level_difference_is_stereo() {
        let metrics = TopologyMetrics {
            channel_count: 2,
            diff_peak_db: Some(-3.0),
            diff_rms_db: Some(-6.0),
            correlation: Some(0.05),
            level_diff_db: Some(2.0),
        };
        assert_eq!(classify_topology(&metrics), Topology::Stereo);
    }

    #[test]
    fn conventional_stereo_pair_is_stereo() {
        let metrics = TopologyMetrics {
            channel_count: 2,
            diff_peak_db: Some(-10.0),
            diff_rms_db: Some(-18.0),
            correlation: Some(0.7),
            level_diff_db: Some(1.0),
        };
        assert_eq!(classify_topology(&metrics), Topology::Stereo);
    }
}
