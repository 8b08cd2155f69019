//! Rule catalog and evaluation: rules are grouped by
//! category, flattened and sorted by priority descending, then evaluated
//! in order to build a [`ConstraintSet`].

use crate::core::types::{Classification, ConstraintEntry, ConstraintSet, Decision, Risks, Signals};

/// Category a rule belongs to, purely for catalog organization — rule
/// evaluation itself only cares about the flattened, priority-sorted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Loudness-related constraints.
    Loudness,
    /// Sub-bass/low-end constraints.
    LowEnd,
    /// Vocal intelligibility constraints.
    Vocal,
    /// Stereo width/phase constraints.
    Stereo,
    /// Dynamics/compression constraints.
    Dynamics,
    /// Cross-platform translation constraints.
    Translation,
    /// Constraints triggered by classification uncertainty itself.
    Uncertainty,
}

/// Everything a rule's condition/action may read.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    /// Measurement-derived signals for the asset under evaluation.
    pub signals: &'a Signals,
    /// Risk scalars for the asset under evaluation.
    pub risks: &'a Risks,
    /// The asset's subgenre classification.
    pub classification: &'a Classification,
}

/// One entry in the rule catalog.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable identifier, referenced by [`Decision::rule_id`].
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Catalog grouping; informational only.
    pub category: Category,
    /// Evaluation priority; higher runs (and wins ties) first.
    pub priority: i32,
    /// Whether a later, lower-priority rule may flag this as replaceable.
    pub overrideable: bool,
    /// Predicate deciding whether this rule fires for `ctx`.
    pub condition: fn(&RuleContext) -> bool,
    /// Produces `(constraint_name, value, reason)` when `condition` holds.
    pub action: fn(&RuleContext) -> (&'static str, serde_json::Value, String),
}

/// The built-in rule catalog.
pub const CATALOG: &[Rule] = &[
    Rule {
        id: "LOUD-001",
        name: "cap loudness increase for high masking risk",
        category: Category::Loudness,
        priority: 90,
        overrideable: false,
        condition: |ctx| ctx.risks.get_or_neutral("maskingRisk") > 0.6,
        action: |ctx| {
            (
                "maxLoudnessIncreaseDb",
                serde_json::json!(1.0),
                format!(
                    "masking risk {:.2} exceeds 0.6; limit further loudness increase",
                    ctx.risks.get_or_neutral("maskingRisk")
                ),
            )
        },
    },
    Rule {
        id: "LOUD-002",
        name: "default loudness increase ceiling",
        category: Category::Loudness,
        priority: 10,
        overrideable: true,
        condition: |_ctx| true,
        action: |_ctx| (
            "maxLoudnessIncreaseDb",
            serde_json::json!(3.0),
            "no elevated masking risk; default ceiling applies".to_string(),
        ),
    },
    Rule {
        id: "LOWEND-001",
        name: "trim sub-bass for heavy sub-bass energy",
        category: Category::LowEnd,
        priority: 80,
        overrideable: false,
        condition: |ctx| ctx.signals.sub_bass_energy.unwrap_or(0.0) > 0.7,
        action: |ctx| (
            "subBassTrimDb",
            serde_json::json!(-2.0),
            format!(
                "sub-bass energy {:.2} is heavy; trim before club/system delivery",
                ctx.signals.sub_bass_energy.unwrap_or(0.0)
            ),
        ),
    },
    Rule {
        id: "VOCAL-001",
        name: "protect vocal intelligibility",
        category: Category::Vocal,
        priority: 85,
        overrideable: false,
        condition: |ctx| ctx.risks.get_or_neutral("vocalIntelligibilityRisk") > 0.6,
        action: |ctx| (
            "vocalDeEssMaxDb",
            serde_json::json!(2.0),
            format!(
                "vocal intelligibility risk {:.2} is high; cap de-essing",
                ctx.risks.get_or_neutral("vocalIntelligibilityRisk")
            ),
        ),
    },
    Rule {
        id: "STEREO-001",
        name: "limit stereo widening for phase collapse risk",
        category: Category::Stereo,
        priority: 75,
        overrideable: false,
        condition: |ctx| ctx.risks.get_or_neutral("phaseCollapseRisk") > 0.6,
        action: |ctx| (
            "maxStereoWidenPercent",
            serde_json::json!(10.0),
            format!(
                "phase collapse risk {:.2} is high; limit further widening",
                ctx.risks.get_or_neutral("phaseCollapseRisk")
            ),
        ),
    },
    Rule {
        id: "DYN-001",
        name: "flag over-compression",
        category: Category::Dynamics,
        priority: 70,
        overrideable: true,
        condition: |ctx| ctx.risks.get_or_neutral("overCompressionRisk") > 0.6,
        action: |_ctx| (
            "bypassBusCompression",
            serde_json::json!(true),
            "over-compression risk is high; bypass additional bus compression".to_string(),
        ),
    },
    Rule {
        id: "TRANS-001",
        name: "guard mono/earbud translation",
        category: Category::Translation,
        priority: 65,
        overrideable: false,
        condition: |ctx| ctx.risks.get_or_neutral("translationRisk") > 0.6,
        action: |ctx| (
            "requireMonoCheck",
            serde_json::json!(true),
            format!(
                "translation risk {:.2} is high; require a mono/earbud compatibility check",
                ctx.risks.get_or_neutral("translationRisk")
            ),
        ),
    },
    Rule {
        id: "UNCERT-001",
        name: "conservative defaults under classification uncertainty",
        category: Category::Uncertainty,
        priority: 95,
        overrideable: false,
        condition: |ctx| ctx.classification.is_uncertain || ctx.classification.conflicting_signals,
        action: |_ctx| (
            "useConservativePreset",
            serde_json::json!(true),
            "subgenre classification is uncertain or signals conflict; apply conservative defaults".to_string(),
        ),
    },
    Rule {
        id: "LOFI-001",
        name: "do not treat lo-fi aesthetic as a defect",
        category: Category::Dynamics,
        priority: 60,
        overrideable: true,
        condition: |ctx| ctx.risks.get_or_neutral("lofiAestheticRisk") < 0.3,
        action: |_ctx| (
            "suppressArtifactWarnings",
            serde_json::json!(true),
            "lo-fi aesthetic risk is low; likely an intentional choice, not a defect".to_string(),
        ),
    },
];

/// Evaluate `rules` (already expected to be the full catalog, any order)
/// against `ctx`: flatten, sort by priority descending, then for every
/// rule whose condition holds, record a [`Decision`] and first-writer-win
/// insert into a [`ConstraintSet`]. A rule whose condition or action panics
/// is logged and skipped via `catch_unwind` under a `panic = "unwind"`
/// profile (the default dev/test profile used by `cargo test`); the
/// release profile builds with `panic = "abort"`, under which a panicking
/// rule still takes the whole process down — `catch_unwind` only guards
/// against misbehaving rules surfacing during development, not in the
/// shipped binary.
pub fn evaluate(ctx: &RuleContext, rules: &[Rule]) -> (Vec<Decision>, ConstraintSet) {
    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut decisions = Vec::new();
    let mut constraints = ConstraintSet::new();

    for rule in ordered {
        let fired = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (rule.condition)(ctx)));
        let fired = match fired {
            Ok(b) => b,
            Err(_) => {
                log::warn!("rule {} condition panicked; skipping", rule.id);
                continue;
            }
        };
        if !fired {
            continue;
        }

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (rule.action)(ctx)));
        let (constraint_name, value, reason) = match outcome {
            Ok(v) => v,
            Err(_) => {
                log::warn!("rule {} action panicked; skipping", rule.id);
                continue;
            }
        };

        decisions.push(Decision {
            rule_id: rule.id.to_string(),
            name: rule.name.to_string(),
            constraint_name: constraint_name.to_string(),
            value: value.clone(),
            reason: reason.clone(),
            overrideable: rule.overrideable,
            priority: rule.priority,
        });

        constraints.insert_if_absent(
            constraint_name,
            ConstraintEntry {
                value,
                reason,
                source_rule_id: rule.id.to_string(),
                overrideable: rule.overrideable,
            },
        );
    }

    (decisions, constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Subgenre;
    use std::collections::HashMap;

    fn neutral_classification() -> Classification {
        Classification {
            primary: Subgenre::from("HOUSE"),
            confidence: 0.8,
            is_uncertain: false,
            conflicting_signals: false,
            top_candidates: vec![],
            likelihoods: HashMap::new(),
        }
    }

    #[test]
    fn higher_priority_rule_wins_the_constraint_name() {
        let signals = Signals::default();
        let risks = Risks {
            masking_risk: Some(0.9),
            ..Default::default()
        };
        let classification = neutral_classification();
        let ctx = RuleContext {
            signals: &signals,
            risks: &risks,
            classification: &classification,
        };
        let (decisions, constraints) = evaluate(&ctx, CATALOG);
        assert!(decisions.iter().any(|d| d.rule_id == "LOUD-001"));
        assert!(decisions.iter().any(|d| d.rule_id == "LOUD-002"));
        // LOUD-001 (priority 90) must win over LOUD-002 (priority 10).
        assert_eq!(constraints.get("maxLoudnessIncreaseDb").unwrap().source_rule_id, "LOUD-001");
    }

    #[test]
    fn uncertainty_rule_fires_when_classification_is_uncertain() {
        let signals = Signals::default();
        let risks = Risks::default();
        let classification = Classification {
            is_uncertain: true,
            ..neutral_classification()
        };
        let ctx = RuleContext {
            signals: &signals,
            risks: &risks,
            classification: &classification,
        };
        let (_decisions, constraints) = evaluate(&ctx, CATALOG);
        assert!(constraints.get("useConservativePreset").is_some());
    }

    #[test]
    fn evaluation_is_deterministic_across_runs() {
        let signals = Signals {
            sub_bass_energy: Some(0.9),
            ..Default::default()
        };
        let risks = Risks::default();
        let classification = neutral_classification();
        let ctx = RuleContext {
            signals: &signals,
            risks: &risks,
            classification: &classification,
        };
        let (decisions_a, _) = evaluate(&ctx, CATALOG);
        let (decisions_b, _) = evaluate(&ctx, CATALOG);
        let ids_a: Vec<_> = decisions_a.iter().map(|d| d.rule_id.clone()).collect();
        let ids_b: Vec<_> = decisions_b.iter().map(|d| d.rule_id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
