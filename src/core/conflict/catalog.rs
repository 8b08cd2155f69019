//! The conflict rule catalog and hard-coded
//! safe substitutions used by `suggestResolutions`.

use super::{Condition, ConflictRule, ConflictSeverity};

/// The static conflict rule catalog.
pub const CATALOG: &[ConflictRule] = &[
    ConflictRule {
        id: "EQ_BOOST_LIMITING",
        name: "heavy EQ boost feeding a hot limiter",
        conditions: &[Condition::Gt("eqBoostMax", 8.0), Condition::Gt("limiterThreshold", -2.0)],
        severity: ConflictSeverity::High,
    },
    ConflictRule {
        id: "EXCESSIVE_EQ_BOOST",
        name: "EQ boost beyond any reasonable ceiling",
        conditions: &[Condition::Gt("eqBoostMax", 12.0)],
        severity: ConflictSeverity::Blocking,
    },
    ConflictRule {
        id: "LIMITER_TOO_HOT",
        name: "limiter threshold leaves almost no headroom",
        conditions: &[Condition::Gt("limiterThreshold", -0.3)],
        severity: ConflictSeverity::High,
    },
    ConflictRule {
        id: "COMPRESSION_RATIO_EXTREME",
        name: "compression ratio approaches a brickwall limiter",
        conditions: &[Condition::Gte("compressionRatio", 20.0)],
        severity: ConflictSeverity::Medium,
    },
    ConflictRule {
        id: "GAIN_CEILING_GAP_TOO_NARROW",
        name: "input gain leaves too little room before the output ceiling",
        conditions: &[Condition::CustomGap { a: "inputGainDb", b: "outputCeilingDb", min_gap: 3.0 }],
        severity: ConflictSeverity::Low,
    },
    ConflictRule {
        id: "SUBBASS_TRIM_VS_BOOST",
        name: "sub-bass trim fighting a bass boost",
        conditions: &[Condition::Lt("subBassTrimDb", -6.0), Condition::Gt("bassBoostDb", 3.0)],
        severity: ConflictSeverity::Medium,
    },
    ConflictRule {
        id: "STEREO_WIDTH_EXTREME",
        name: "stereo widening beyond a safe mono-compatible range",
        conditions: &[Condition::Gt("stereoWidenPercent", 50.0)],
        severity: ConflictSeverity::High,
    },
    ConflictRule {
        id: "DEESS_OVER_LIMIT",
        name: "de-essing amount likely to dull sibilants audibly",
        conditions: &[Condition::Gt("deEssAmountDb", 6.0)],
        severity: ConflictSeverity::Medium,
    },
    ConflictRule {
        id: "NORMALIZE_TARGET_TOO_LOUD",
        name: "normalization target louder than any delivery platform expects",
        conditions: &[Condition::Gt("normalizeTargetLufs", -9.0)],
        severity: ConflictSeverity::Low,
    },
    ConflictRule {
        id: "CLUB_PRESET_SOFT_LIMITER",
        name: "club preset intent paired with an unusually soft limiter",
        conditions: &[Condition::In("presetIntent", &["club"]), Condition::Lt("limiterThreshold", -6.0)],
        severity: ConflictSeverity::Medium,
    },
];

/// Hard-coded safe substitution for `rule_id`, if one is defined. `None`
/// means the conflict has no automatic fix.
pub fn safe_substitution(rule_id: &str) -> Option<Vec<(&'static str, serde_json::Value)>> {
    match rule_id {
        "EQ_BOOST_LIMITING" => Some(vec![
            ("eqBoostMax", serde_json::json!(6.0)),
            ("limiterThreshold", serde_json::json!(-6.0)),
        ]),
        "EXCESSIVE_EQ_BOOST" => Some(vec![("eqBoostMax", serde_json::json!(6.0))]),
        "LIMITER_TOO_HOT" => Some(vec![("limiterThreshold", serde_json::json!(-1.0))]),
        "COMPRESSION_RATIO_EXTREME" => Some(vec![("compressionRatio", serde_json::json!(8.0))]),
        "STEREO_WIDTH_EXTREME" => Some(vec![("stereoWidenPercent", serde_json::json!(30.0))]),
        "DEESS_OVER_LIMIT" => Some(vec![("deEssAmountDb", serde_json::json!(4.0))]),
        "NORMALIZE_TARGET_TOO_LOUD" => Some(vec![("normalizeTargetLufs", serde_json::json!(-14.0))]),
        _ => None,
    }
}
