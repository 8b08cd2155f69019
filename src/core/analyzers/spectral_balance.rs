//! Spectral Balance analyzer: compares ten ISO-266
//! octave-band RMS levels against a reference curve and flags which
//! region (if any) is out of balance.

use std::path::Path;

use async_trait::async_trait;

use super::{dsp, Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when the octave-band breakdown could not be measured.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";

/// The ten ISO-266 octave-band center frequencies tracked, in Hz.
pub const OCTAVE_BANDS_HZ: [f64; 10] = [31.5, 63.0, 125.0, 250.0, 500.0, 1_000.0, 2_000.0, 4_000.0, 8_000.0, 16_000.0];

/// A reference spectral-balance curve: expected RMS level per octave band,
/// in dB relative to broadband RMS. Modeled loosely on a commercial/dance
/// mastering reference.
pub const REFERENCE_CURVE_DB: [f64; 10] = [-18.0, -12.0, -9.0, -8.0, -9.0, -9.0, -10.0, -12.0, -16.0, -22.0];

/// Region of the spectrum an imbalance was localized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImbalanceRegion {
    /// No meaningful imbalance.
    None,
    /// Bands 0-1 (sub/bass).
    Low,
    /// Bands 2-3 (low-mid).
    LowMid,
    /// Bands 4-5 (mid).
    Mid,
    /// Bands 6-7 (high-mid).
    HighMid,
    /// Bands 8-9 (high/air).
    High,
}

impl ImbalanceRegion {
    fn as_str(self) -> &'static str {
        match self {
            ImbalanceRegion::None => "NONE",
            ImbalanceRegion::Low => "LOW",
            ImbalanceRegion::LowMid => "LOW_MID",
            ImbalanceRegion::Mid => "MID",
            ImbalanceRegion::HighMid => "HIGH_MID",
            ImbalanceRegion::High => "HIGH",
        }
    }

    fn from_band_index(i: usize) -> Self {
        match i {
            0 | 1 => ImbalanceRegion::Low,
            2 | 3 => ImbalanceRegion::LowMid,
            4 | 5 => ImbalanceRegion::Mid,
            6 | 7 => ImbalanceRegion::HighMid,
            _ => ImbalanceRegion::High,
        }
    }
}

/// Overall deviation-from-reference bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
    /// Within 2 dB of the reference curve everywhere.
    Balanced,
    /// Up to 4 dB deviation in the worst band.
    Slight,
    /// Up to 7 dB deviation.
    Moderate,
    /// Up to 10 dB deviation.
    Significant,
    /// More than 10 dB deviation.
    Extreme,
}

impl BalanceStatus {
    fn as_str(self) -> &'static str {
        match self {
            BalanceStatus::Balanced => "BALANCED",
            BalanceStatus::Slight => "SLIGHT",
            BalanceStatus::Moderate => "MODERATE",
            BalanceStatus::Significant => "SIGNIFICANT",
            BalanceStatus::Extreme => "EXTREME",
        }
    }

    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            BalanceStatus::Balanced => Severity::None,
            BalanceStatus::Slight => Severity::Low,
            BalanceStatus::Moderate => Severity::Moderate,
            BalanceStatus::Significant => Severity::High,
            BalanceStatus::Extreme => Severity::Critical,
        }
    }

    fn from_deviation(deviation_db: f64) -> Self {
        if deviation_db <= 2.0 {
            BalanceStatus::Balanced
        } else if deviation_db <= 4.0 {
            BalanceStatus::Slight
        } else if deviation_db < 6.0 {
            BalanceStatus::Moderate
        } else if deviation_db <= 10.0 {
            BalanceStatus::Significant
        } else {
            BalanceStatus::Extreme
        }
    }
}

/// Half-octave-wide `(low_hz, high_hz)` bands centered on each of
/// [`OCTAVE_BANDS_HZ`].
fn octave_band_ranges() -> Vec<(f64, f64)> {
    const HALF_OCTAVE: f64 = std::f64::consts::SQRT_2;
    OCTAVE_BANDS_HZ.iter().map(|c| (c / HALF_OCTAVE, c * HALF_OCTAVE)).collect()
}

/// An energy ratio (power, `[0, 1]`) to dB relative to broadband RMS.
fn ratio_to_db(ratio: f64) -> f64 {
    if ratio <= 0.0 {
        -60.0
    } else {
        10.0 * ratio.log10()
    }
}

/// Inputs to [`classify_balance`]: ten octave-band RMS levels, in dB
/// relative to broadband RMS, matching [`OCTAVE_BANDS_HZ`] order.
#[derive(Debug, Clone)]
pub struct BandRms {
    /// Per-band RMS, in dB relative to broadband RMS.
    pub bands_db: [Option<f64>; 10],
}

/// Result of classifying spectral balance.
#[derive(Debug, Clone)]
pub struct BalanceClassification {
    /// Overall deviation bucket.
    pub status: BalanceStatus,
    /// Region holding the largest deviation, if any.
    pub region: ImbalanceRegion,
    /// Largest single-band deviation, in dB.
    pub max_deviation_db: f64,
}

/// Pure classification.
pub fn classify_balance(bands: &BandRms) -> Option<BalanceClassification> {
    if bands.bands_db.iter().any(|b| b.is_none()) {
        return None;
    }

    let mut max_deviation_db = 0.0_f64;
    let mut worst_index = 0usize;
    for (i, (measured, reference)) in bands.bands_db.iter().zip(REFERENCE_CURVE_DB.iter()).enumerate() {
        let deviation = (measured.unwrap() - reference).abs();
        if deviation > max_deviation_db {
            max_deviation_db = deviation;
            worst_index = i;
        }
    }

    let status = BalanceStatus::from_deviation(max_deviation_db);
    let region = if matches!(status, BalanceStatus::Balanced) {
        ImbalanceRegion::None
    } else {
        ImbalanceRegion::from_band_index(worst_index)
    };

    Some(BalanceClassification {
        status,
        region,
        max_deviation_db,
    })
}

fn build_report(bands: &BandRms, confidence: f64) -> AnalyzerReport {
    let Some(c) = classify_balance(bands) else {
        return super::neutral_report(NEUTRAL_STATUS, "octave-band RMS not fully measured");
    };

    let mut recommendations = Vec::new();
    if matches!(c.status, BalanceStatus::Significant | BalanceStatus::Extreme) {
        recommendations.push(format!("revisit EQ in the {} region", c.region.as_str()));
    }

    AnalyzerReport {
        status: c.status.as_str().to_string(),
        score: Some((100.0 - c.max_deviation_db * 7.0).clamp(0.0, 100.0)),
        measurements: serde_json::json!({
            "bandsDb": bands.bands_db,
            "region": c.region.as_str(),
            "maxDeviationDb": c.max_deviation_db,
        }),
        description: format!(
            "max deviation {:.1} dB in the {} region",
            c.max_deviation_db,
            c.region.as_str()
        ),
        recommendations,
        confidence,
        analysis_time_ms: 0,
    }
}

/// The spectral balance analyzer. Octave-band RMS comes from in-process
/// decoded samples, not the external tool; `new` still takes
/// `&AnalyzerOptions` to match the rest of the fan-out.
pub struct SpectralBalanceAnalyzer;

impl SpectralBalanceAnalyzer {
    /// Build the analyzer. `options` is unused (no external-tool call).
    pub fn new(_options: &AnalyzerOptions) -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for SpectralBalanceAnalyzer {
    type Metrics = BandRms;

    async fn analyze(&self, path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        let decoded = match dsp::decode_channels(path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("spectral balance decode failed for {}: {e}", path.display());
                return Ok(super::neutral_report(NEUTRAL_STATUS, e.to_string()));
            }
        };
        let mono = dsp::to_mono(&decoded.channels);
        let ranges = octave_band_ranges();
        let ratios = dsp::band_energy_ratios(&mono, decoded.sample_rate, &ranges);

        let mut bands_db: [Option<f64>; 10] = [None; 10];
        for (i, ratio) in ratios.into_iter().enumerate() {
            bands_db[i] = Some(ratio_to_db(ratio));
        }
        Ok(build_report(&BandRms { bands_db }, 0.8))
    }

    fn quick_check(&self, _path: &Path) -> SonarGateResult<CompactReport> {
        Ok(CompactReport {
            status: NEUTRAL_STATUS.to_string(),
            score: None,
        })
    }

    fn classify(&self, metrics: &BandRms) -> AnalyzerReport {
        build_report(metrics, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_curve_itself_is_balanced() {
        let bands = BandRms {
            bands_db: REFERENCE_CURVE_DB.map(Some),
        };
        let c = classify_balance(&bands).unwrap();
        assert_eq!(c.status, BalanceStatus::Balanced);
        assert_eq!(c.region, ImbalanceRegion::None);
    }

    #[test]
    fn boosted_high_band_is_localized_to_high_region() {
        let mut bands_db = REFERENCE_CURVE_DB;
        bands_db[9] += 12.0;
        let bands = BandRms { bands_db: bands_db.map(Some) };
        let c = classify_balance(&bands).unwrap();
        assert_eq!(c.status, BalanceStatus::Extreme);
        assert_eq!(c.region, ImbalanceRegion::High);
    }

    #[test]
    fn missing_band_is_neutral() {
        let mut bands_db: [Option<f64>; 10] = REFERENCE_CURVE_DB.map(Some);
        bands_db[3] = None;
        let bands = BandRms { bands_db };
        let report = build_report(&bands, 0.0);
        assert_eq!(report.status, NEUTRAL_STATUS);
    }
}
