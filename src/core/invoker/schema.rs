//! Line-oriented regex schema for the external tool's diagnostic output.
//!
//! Regex-based parsing of a black-box tool's stderr is brittle by nature;
//! per the design notes this keeps every pattern in one place and tests each
//! against a recorded fixture string rather than scattering `Regex::new`
//! calls across the analyzers.

use std::collections::HashMap;

use regex::Regex;

/// One field of a [`MetricSchema`]: a name and the regex that extracts its
/// numeric value from a single line of tool output. The regex's first
/// capture group must be the number.
pub struct MetricField {
    /// Field name used as the key in the parsed metrics map.
    pub name: &'static str,
    pattern: Regex,
}

/// An ordered table of fields to extract from a tool's stderr.
pub struct MetricSchema {
    fields: Vec<MetricField>,
}

impl MetricSchema {
    /// Build a schema from `(name, regex)` pairs. Panics on an invalid
    /// regex; this is only ever called with patterns fixed at compile time.
    pub fn new(fields: &[(&'static str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(name, pattern)| MetricField {
                name,
                pattern: Regex::new(pattern).expect("invalid metric schema pattern"),
            })
            .collect();
        Self { fields }
    }

    /// The schema covering the fields common across the loudness,
    /// intersample-peak, clipping, and club-stress analyzers.
    pub fn default_astats_ebur128() -> Self {
        Self::new(&[
            ("integrated_loudness", r"(?i)integrated loudness:\s*I:\s*(-?\d+(?:\.\d+)?)"),
            ("true_peak", r"(?i)true peak:\s*(-?\d+(?:\.\d+)?)"),
            ("loudness_range", r"(?i)loudness range:\s*LRA:\s*(-?\d+(?:\.\d+)?)"),
            ("peak_level_db", r"(?i)peak level dB:\s*(-?\d+(?:\.\d+)?)"),
            ("rms_level_db", r"(?i)rms level dB:\s*(-?\d+(?:\.\d+)?)"),
            ("crest_factor", r"(?i)crest factor:\s*(-?\d+(?:\.\d+)?)"),
            ("flat_factor", r"(?i)flat factor:\s*(-?\d+(?:\.\d+)?)"),
        ])
    }
}

/// Parse `stderr` against `schema`, returning every schema field as a key.
/// A field with no matching line maps to `None` — never a default value;
/// the caller decides what a missing metric means.
pub fn parse_metrics(stderr: &str, schema: &MetricSchema) -> HashMap<String, Option<f64>> {
    let mut out: HashMap<String, Option<f64>> =
        schema.fields.iter().map(|f| (f.name.to_string(), None)).collect();

    for line in stderr.lines() {
        for field in &schema.fields {
            if out.get(field.name).copied().flatten().is_some() {
                continue;
            }
            if let Some(caps) = field.pattern.captures(line) {
                if let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                    out.insert(field.name.to_string(), Some(value));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
Parsed_astats_0 @ 0x1234: Peak level dB: -1.3
Parsed_astats_0 @ 0x1234: RMS level dB: -14.8
Parsed_astats_0 @ 0x1234: Crest factor: 3.2
Parsed_astats_0 @ 0x1234: Flat factor: 0.12
Integrated loudness: I: -14.2 LUFS
True peak: -0.8 dBTP
Loudness range: LRA: 7.0 LU
";

    #[test]
    fn extracts_every_field_from_fixture() {
        let schema = MetricSchema::default_astats_ebur128();
        let metrics = parse_metrics(FIXTURE, &schema);
        assert_eq!(metrics["integrated_loudness"], Some(-14.2));
        assert_eq!(metrics["true_peak"], Some(-0.8));
        assert_eq!(metrics["loudness_range"], Some(7.0));
        assert_eq!(metrics["peak_level_db"], Some(-1.3));
        assert_eq!(metrics["rms_level_db"], Some(-14.8));
        assert_eq!(metrics["crest_factor"], Some(3.2));
        assert_eq!(metrics["flat_factor"], Some(0.12));
    }

    #[test]
    fn missing_field_is_none_not_defaulted() {
        let schema = MetricSchema::default_astats_ebur128();
        let metrics = parse_metrics("Peak level dB: -1.3", &schema);
        assert_eq!(metrics["peak_level_db"], Some(-1.3));
        assert_eq!(metrics["true_peak"], None);
    }

    #[test]
    fn custom_schema_extracts_single_field() {
        let schema = MetricSchema::new(&[("gain", r"gain:\s*(-?\d+(?:\.\d+)?)")]);
        let metrics = parse_metrics("applying gain: -6.5 dB now", &schema);
        assert_eq!(metrics["gain"], Some(-6.5));
    }
}
