//! External subgenre heuristics table:
//! the concrete subgenre scoring function is data, not code, so a systems
//! port never has to embed classifier behavior. Loaded from TOML; falls
//! back to a small built-in table when no path is configured, so the
//! engine is usable without external files in tests and examples.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SonarGateResult;

/// One subgenre's scoring weights against each [`crate::core::types::Signals`]
/// field, plus its per-risk weight vector for [`super::weights::risk_weights`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgenreHeuristic {
    /// Subgenre label, e.g. `"TRAP"`.
    pub name: String,
    /// Constant term added before weighting signals.
    pub bias: f64,
    /// Per-signal linear weight, keyed by the same camelCase names as
    /// `Signals`' fields (missing signals contribute 0, not a penalty).
    pub signal_weights: HashMap<String, f64>,
    /// Per-risk-kind weight used to compute this subgenre's weighted
    /// confidence.
    pub risk_weights: HashMap<String, f64>,
    /// `true` only for entries added in the v2 table revision; v1
    /// consumers should ignore this field rather than fail on it.
    #[serde(default)]
    pub v2_only: bool,
}

/// The full subgenre heuristics table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsTable {
    /// One entry per classifiable subgenre.
    pub subgenres: Vec<SubgenreHeuristic>,
}

impl HeuristicsTable {
    /// Load from a TOML file at `path`.
    pub fn load(path: &Path) -> SonarGateResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| crate::error::SonarGateError::config(e.to_string()))
    }

    /// A small built-in table covering four representative subgenres,
    /// used when no external table is configured.
    pub fn built_in() -> Self {
        let weights = |pairs: &[(&str, f64)]| -> HashMap<String, f64> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };

        Self {
            subgenres: vec![
                SubgenreHeuristic {
                    name: "TRAP".to_string(),
                    bias: 0.1,
                    signal_weights: weights(&[
                        ("subBassEnergy", 0.6),
                        ("transientDensity", 0.4),
                        ("dynamicRange", -0.2),
                    ]),
                    risk_weights: weights(&[
                        ("maskingRisk", 1.2),
                        ("clippingRisk", 0.8),
                        ("translationRisk", 1.0),
                    ]),
                    v2_only: false,
                },
                SubgenreHeuristic {
                    name: "HOUSE".to_string(),
                    bias: 0.05,
                    signal_weights: weights(&[
                        ("subBassEnergy", 0.3),
                        ("transientDensity", 0.2),
                        ("stereoWidth", 0.3),
                    ]),
                    risk_weights: weights(&[
                        ("overCompressionRisk", 1.1),
                        ("phaseCollapseRisk", 0.9),
                    ]),
                    v2_only: false,
                },
                SubgenreHeuristic {
                    name: "LOFI".to_string(),
                    bias: 0.0,
                    signal_weights: weights(&[
                        ("vinylNoise", 0.7),
                        ("highFreqRolloff", 0.5),
                        ("dynamicRange", 0.1),
                    ]),
                    risk_weights: weights(&[
                        ("lofiAestheticRisk", -0.5),
                        ("artifactRisk", 0.6),
                    ]),
                    v2_only: false,
                },
                SubgenreHeuristic {
                    name: "BALLAD".to_string(),
                    bias: 0.05,
                    signal_weights: weights(&[
                        ("dynamicRange", 0.6),
                        ("reverbDecay", 0.4),
                        ("transientDensity", -0.3),
                    ]),
                    risk_weights: weights(&[
                        ("vocalIntelligibilityRisk", 1.3),
                        ("maskingRisk", 0.7),
                    ]),
                    v2_only: true,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_has_distinct_subgenres() {
        let table = HeuristicsTable::built_in();
        let names: std::collections::HashSet<_> = table.subgenres.iter().map(|s| &s.name).collect();
        assert_eq!(names.len(), table.subgenres.len());
    }
}
