//! `getRiskWeights` and weighted-confidence aggregation.

use std::collections::HashMap;

use super::heuristics::HeuristicsTable;
use crate::core::types::{Classification, Risks};

/// Per-risk-kind weight vector for one subgenre. Unknown risk kinds
/// default to a neutral weight of `1.0` so an unweighted risk still
/// contributes proportionally rather than vanishing.
pub fn risk_weights(table: &HeuristicsTable, classification: &Classification) -> HashMap<String, f64> {
    let Some(entry) = table.subgenres.iter().find(|s| s.name == classification.primary.0) else {
        return Risks::KINDS.iter().map(|k| (k.to_string(), 1.0)).collect();
    };

    Risks::KINDS
        .iter()
        .map(|k| (k.to_string(), *entry.risk_weights.get(*k).unwrap_or(&1.0)))
        .collect()
}

/// Result of [`weighted_confidence`].
#[derive(Debug, Clone)]
pub struct WeightedConfidence {
    /// Each risk kind's value scaled by its weight.
    pub weighted_risks: HashMap<String, f64>,
    /// Weighted mean risk across all kinds, in `[0,1]`.
    pub aggregate_risk: f64,
    /// `1 - aggregate_risk`, clamped to `[0,1]`.
    pub confidence: f64,
}

/// `calculateWeightedConfidence`: combine `base_risks` with
/// `risk_weights` into an aggregate risk and its complementary confidence.
pub fn weighted_confidence(base_risks: &Risks, weights: &HashMap<String, f64>) -> WeightedConfidence {
    let mut weighted_risks = HashMap::with_capacity(Risks::KINDS.len());
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for kind in Risks::KINDS {
        let value = base_risks.get_or_neutral(kind);
        let weight = *weights.get(kind).unwrap_or(&1.0);
        weighted_risks.insert(kind.to_string(), value * weight);
        weighted_sum += value * weight;
        weight_sum += weight;
    }

    let aggregate_risk = if weight_sum.abs() > f64::EPSILON {
        (weighted_sum / weight_sum).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let confidence = (1.0 - aggregate_risk).clamp(0.0, 1.0);

    WeightedConfidence {
        weighted_risks,
        aggregate_risk,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Subgenre;

    #[test]
    fn unknown_subgenre_gets_neutral_weights() {
        let table = HeuristicsTable { subgenres: vec![] };
        let classification = Classification {
            primary: Subgenre::from("UNKNOWN_GENRE"),
            confidence: 0.5,
            is_uncertain: true,
            conflicting_signals: false,
            top_candidates: vec![],
            likelihoods: HashMap::new(),
        };
        let weights = risk_weights(&table, &classification);
        assert_eq!(weights.len(), Risks::KINDS.len());
        assert!(weights.values().all(|w| *w == 1.0));
    }

    #[test]
    fn all_neutral_risks_yield_neutral_aggregate() {
        let weights: HashMap<String, f64> = Risks::KINDS.iter().map(|k| (k.to_string(), 1.0)).collect();
        let wc = weighted_confidence(&Risks::default(), &weights);
        assert!((wc.aggregate_risk - crate::core::types::NEUTRAL_RISK).abs() < 1e-9);
        assert!((wc.confidence - (1.0 - crate::core::types::NEUTRAL_RISK)).abs() < 1e-9);
    }

    #[test]
    fn higher_weighted_risk_lowers_confidence() {
        let mut weights: HashMap<String, f64> = Risks::KINDS.iter().map(|k| (k.to_string(), 1.0)).collect();
        weights.insert("maskingRisk".to_string(), 5.0);
        let risks = Risks {
            masking_risk: Some(0.9),
            ..Default::default()
        };
        let wc = weighted_confidence(&risks, &weights);
        assert!(wc.aggregate_risk > crate::core::types::NEUTRAL_RISK);
        assert!(wc.confidence < 1.0 - crate::core::types::NEUTRAL_RISK);
    }
}
