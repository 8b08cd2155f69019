//! Best-effort bridge from analyzer measurements to [`Signals`].
//!
//! The analyzer suite and the classification engine's input
//! shape are specified independently; nothing in the
//! distilled spec names which analyzer produces which signal. This module
//! is the Open Question resolution (see `DESIGN.md`): a handful of signals
//! have a direct, well-grounded analyzer counterpart (loudness range is
//! exactly a dynamic-range measure; stereo correlation is exactly a width
//! measure); the rest are approximated from the closest available
//! measurement and documented as such per field. Callers that have a real
//! signals source (e.g. a dedicated preprocessing pass) should prefer that
//! over this bridge.

use std::collections::HashMap;

use crate::core::types::Signals;

use super::super::analyzers::AnalyzerReport;

fn measurement(reports: &HashMap<String, AnalyzerReport>, analyzer: &str, field: &str) -> Option<f64> {
    reports.get(analyzer)?.measurements.get(field)?.as_f64()
}

/// Approximate [`Signals`] from whichever of the nine analyzer reports are
/// present, keyed by analyzer name (`"loudness"`, `"channel_topology"`,
/// `"club_stress"`, `"clipping"`, `"spectral_balance"`, ...). Any signal with
/// no grounded analyzer counterpart is left `None` rather than guessed.
pub fn approximate_signals_from_reports(reports: &HashMap<String, AnalyzerReport>) -> Signals {
    let dynamic_range = measurement(reports, "loudness", "lra").map(|lra| (lra / 20.0).clamp(0.0, 1.0));

    let stereo_width = measurement(reports, "channel_topology", "correlation").map(|corr| (1.0 - corr).clamp(0.0, 1.0));

    let sub_bass_energy = measurement(reports, "club_stress", "sub").map(|v| v.clamp(0.0, 1.0));

    // Clip density is a proxy for how transient-dense the material reads,
    // not a direct transient detector; approximate only.
    let transient_density = measurement(reports, "clipping", "clipDensity").map(|v| (v * 50.0).clamp(0.0, 1.0));

    // Flat-topped waveform sections read as a distortion proxy.
    let distortion = measurement(reports, "clipping", "flatFactor").map(|v| v.clamp(0.0, 1.0));

    // `bandsDb` is a 10-element array in `OCTAVE_BANDS_HZ` order; index 9
    // is the 16 kHz band, the "air"/high-frequency region.
    const HIGH_BAND_INDEX: usize = 9;
    let high_freq_rolloff = reports
        .get("spectral_balance")
        .and_then(|r| r.measurements.get("bandsDb"))
        .and_then(|bands| bands.get(HIGH_BAND_INDEX))
        .and_then(|v| v.as_f64())
        .map(|db| (1.0 - (db.abs() / 20.0)).clamp(0.0, 1.0));

    Signals {
        sub_bass_energy,
        transient_density,
        dynamic_range,
        stereo_width,
        mix_balance: None,
        vinyl_noise: None,
        reverb_decay: None,
        high_freq_rolloff,
        distortion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(measurements: serde_json::Value) -> AnalyzerReport {
        AnalyzerReport {
            status: "OK".to_string(),
            score: None,
            measurements,
            description: String::new(),
            recommendations: Vec::new(),
            confidence: 1.0,
            analysis_time_ms: 0,
        }
    }

    #[test]
    fn dynamic_range_derives_from_loudness_range() {
        let mut reports = HashMap::new();
        reports.insert("loudness".to_string(), report(serde_json::json!({ "lra": 10.0 })));
        let signals = approximate_signals_from_reports(&reports);
        assert_eq!(signals.dynamic_range, Some(0.5));
    }

    #[test]
    fn missing_analyzer_leaves_signal_absent() {
        let reports = HashMap::new();
        let signals = approximate_signals_from_reports(&reports);
        assert!(signals.dynamic_range.is_none());
        assert!(signals.vinyl_noise.is_none());
    }

    #[test]
    fn stereo_width_derives_from_inverse_correlation() {
        let mut reports = HashMap::new();
        reports.insert(
            "channel_topology".to_string(),
            report(serde_json::json!({ "correlation": 0.2 })),
        );
        let signals = approximate_signals_from_reports(&reports);
        assert_eq!(signals.stereo_width, Some(0.8));
    }

    #[test]
    fn sub_bass_energy_derives_from_club_stress_sub_band() {
        let mut reports = HashMap::new();
        reports.insert("club_stress".to_string(), report(serde_json::json!({ "sub": 0.3 })));
        let signals = approximate_signals_from_reports(&reports);
        assert_eq!(signals.sub_bass_energy, Some(0.3));
    }

    #[test]
    fn transient_density_derives_from_clip_density() {
        let mut reports = HashMap::new();
        reports.insert("clipping".to_string(), report(serde_json::json!({ "clipDensity": 0.01 })));
        let signals = approximate_signals_from_reports(&reports);
        assert_eq!(signals.transient_density, Some(0.5));
    }

    #[test]
    fn high_freq_rolloff_reads_the_high_band_by_index_not_by_key() {
        let mut bands_db = [Some(-18.0); 10];
        bands_db[9] = Some(-4.0);
        let mut reports = HashMap::new();
        reports.insert(
            "spectral_balance".to_string(),
            report(serde_json::json!({ "bandsDb": bands_db })),
        );
        let signals = approximate_signals_from_reports(&reports);
        assert_eq!(signals.high_freq_rolloff, Some(0.8));
    }
}
