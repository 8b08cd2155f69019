//! Parameter Conflict Detector: a static catalog of rules
//! over a merged parameter context, evaluated to flag combinations that
//! would fight each other (e.g. heavy EQ boost feeding a hot limiter).

pub mod catalog;

use std::collections::HashMap;

pub use catalog::{safe_substitution, CATALOG};

/// Merged `{currentAnalysis, proposedParams, presetIntent}` parameter
/// context, after alias normalization.
pub type Params = HashMap<String, serde_json::Value>;

/// Parameter name aliases normalized before rule evaluation.
const ALIASES: &[(&str, &str)] = &[
    ("eq_boost", "eqBoostMax"),
    ("limiter_threshold", "limiterThreshold"),
    ("compression_ratio", "compressionRatio"),
    ("stereo_widen", "stereoWidenPercent"),
];

/// Rewrite any alias keys in `params` to their canonical name, leaving
/// unrecognized keys untouched. If both an alias and its canonical name
/// are present, the canonical value wins.
pub fn normalize_aliases(params: &Params) -> Params {
    let mut out = Params::new();
    for (key, value) in params {
        let canonical = ALIASES.iter().find(|(alias, _)| alias == key).map(|(_, c)| *c).unwrap_or(key.as_str());
        out.entry(canonical.to_string()).or_insert_with(|| value.clone());
    }
    out
}

fn get_f64(params: &Params, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.as_f64())
}

/// A single rule's condition against named parameters.
#[derive(Debug, Clone)]
pub enum Condition {
    /// `params[name] > value`.
    Gt(&'static str, f64),
    /// `params[name] >= value`.
    Gte(&'static str, f64),
    /// `params[name] < value`.
    Lt(&'static str, f64),
    /// `params[name] <= value`.
    Lte(&'static str, f64),
    /// `params[name] == value`.
    Eq(&'static str, f64),
    /// `params[name] != value`.
    Neq(&'static str, f64),
    /// `params[name]` is one of `values`.
    In(&'static str, &'static [&'static str]),
    /// `|params[a] - params[b]| < min_gap` (a gap violation, not satisfaction).
    CustomGap {
        /// First parameter name.
        a: &'static str,
        /// Second parameter name.
        b: &'static str,
        /// Minimum acceptable gap between the two.
        min_gap: f64,
    },
}

impl Condition {
    /// Evaluate against `params`; a condition referencing a missing
    /// parameter is simply not satisfied (never panics).
    pub fn holds(&self, params: &Params) -> bool {
        match self {
            Condition::Gt(name, v) => get_f64(params, name).map(|x| x > *v).unwrap_or(false),
            Condition::Gte(name, v) => get_f64(params, name).map(|x| x >= *v).unwrap_or(false),
            Condition::Lt(name, v) => get_f64(params, name).map(|x| x < *v).unwrap_or(false),
            Condition::Lte(name, v) => get_f64(params, name).map(|x| x <= *v).unwrap_or(false),
            Condition::Eq(name, v) => get_f64(params, name).map(|x| (x - v).abs() < f64::EPSILON).unwrap_or(false),
            Condition::Neq(name, v) => get_f64(params, name).map(|x| (x - v).abs() >= f64::EPSILON).unwrap_or(false),
            Condition::In(name, values) => params
                .get(*name)
                .and_then(|v| v.as_str())
                .map(|s| values.contains(&s))
                .unwrap_or(false),
            Condition::CustomGap { a, b, min_gap } => match (get_f64(params, a), get_f64(params, b)) {
                (Some(x), Some(y)) => (x - y).abs() < *min_gap,
                _ => false,
            },
        }
    }
}

/// Conflict severity ladder, distinct from the analyzer
/// suite's [`crate::core::analyzers::Severity`] ladder since `BLOCKING`
/// carries enqueue-refusal semantics the analyzer ladder has no analog
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConflictSeverity {
    /// No conflict.
    None,
    /// Worth a note.
    Low,
    /// Worth fixing before delivery.
    Medium,
    /// Should be fixed before delivery.
    High,
    /// MUST be fixed; the caller refuses to enqueue processing work.
    Blocking,
}

impl ConflictSeverity {
    fn as_str(self) -> &'static str {
        match self {
            ConflictSeverity::None => "NONE",
            ConflictSeverity::Low => "LOW",
            ConflictSeverity::Medium => "MEDIUM",
            ConflictSeverity::High => "HIGH",
            ConflictSeverity::Blocking => "BLOCKING",
        }
    }
}

/// A rule in the conflict catalog: all of `conditions` must hold for the
/// rule to fire.
#[derive(Clone)]
pub struct ConflictRule {
    /// Stable identifier, e.g. `"EQ_BOOST_LIMITING"`.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Every condition must hold (AND) for the rule to fire.
    pub conditions: &'static [Condition],
    /// Severity assigned when the rule fires.
    pub severity: ConflictSeverity,
}

/// A detected conflict.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// Rule id that fired.
    pub rule_id: String,
    /// Human-readable name.
    pub name: String,
    /// Assigned severity.
    pub severity: ConflictSeverity,
}

/// `detectConflicts(params)`: every catalog rule whose conditions all
/// hold, sorted BLOCKING first.
pub fn detect_conflicts(params: &Params) -> Vec<Conflict> {
    let params = normalize_aliases(params);
    let mut conflicts: Vec<Conflict> = CATALOG
        .iter()
        .filter(|rule| rule.conditions.iter().all(|c| c.holds(&params)))
        .map(|rule| Conflict {
            rule_id: rule.id.to_string(),
            name: rule.name.to_string(),
            severity: rule.severity,
        })
        .collect();
    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));
    conflicts
}

/// Result of [`validate_parameters`].
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// `true` iff no conflict reached [`ConflictSeverity::Blocking`].
    pub is_valid: bool,
    /// `true` iff any conflict reached `High` or `Blocking`.
    pub has_errors: bool,
    /// `true` iff any conflict reached `Low` or `Medium`.
    pub has_warnings: bool,
    /// Every detected conflict, BLOCKING first.
    pub conflicts: Vec<Conflict>,
    /// Human-readable recommendations, one per conflict.
    pub recommendations: Vec<String>,
}

/// `validateParameters(params)`.
pub fn validate_parameters(params: &Params) -> ValidationResult {
    let conflicts = detect_conflicts(params);
    let is_valid = !conflicts.iter().any(|c| c.severity == ConflictSeverity::Blocking);
    let has_errors = conflicts
        .iter()
        .any(|c| matches!(c.severity, ConflictSeverity::High | ConflictSeverity::Blocking));
    let has_warnings = conflicts
        .iter()
        .any(|c| matches!(c.severity, ConflictSeverity::Low | ConflictSeverity::Medium));
    let recommendations = conflicts
        .iter()
        .map(|c| format!("{} ({}): review {}", c.rule_id, c.severity.as_str(), c.name))
        .collect();

    ValidationResult {
        is_valid,
        has_errors,
        has_warnings,
        conflicts,
        recommendations,
    }
}

/// Result of [`suggest_resolutions`].
#[derive(Debug, Clone)]
pub struct Resolutions {
    /// Proposed parameter overrides, merged across every resolved conflict.
    pub suggestions: Params,
    /// Number of conflicts a suggestion was available for.
    pub resolved_conflict_count: usize,
}

/// `suggestResolutions(params, conflicts)`: hard-coded safe substitutions
/// per rule id, merged into one suggestion map.
pub fn suggest_resolutions(_params: &Params, conflicts: &[Conflict]) -> Resolutions {
    let mut suggestions = Params::new();
    let mut resolved_conflict_count = 0;

    for conflict in conflicts {
        if let Some(fixes) = safe_substitution(&conflict.rule_id) {
            resolved_conflict_count += 1;
            for (key, value) in fixes {
                suggestions.insert(key.to_string(), value);
            }
        }
    }

    Resolutions {
        suggestions,
        resolved_conflict_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), serde_json::json!(v))).collect()
    }

    #[test]
    fn eq_boost_with_hot_limiter_is_high_severity_conflict() {
        let p = params(&[("eqBoostMax", 9.0), ("limiterThreshold", -1.0)]);
        let conflicts = detect_conflicts(&p);
        let hit = conflicts.iter().find(|c| c.rule_id == "EQ_BOOST_LIMITING").unwrap();
        assert_eq!(hit.severity, ConflictSeverity::High);

        let resolutions = suggest_resolutions(&p, &conflicts);
        assert_eq!(resolutions.suggestions.get("eqBoostMax").unwrap().as_f64(), Some(6.0));
        assert_eq!(resolutions.suggestions.get("limiterThreshold").unwrap().as_f64(), Some(-6.0));
    }

    #[test]
    fn alias_is_normalized_before_evaluation() {
        let mut p = Params::new();
        p.insert("eq_boost".to_string(), serde_json::json!(9.0));
        p.insert("limiterThreshold".to_string(), serde_json::json!(-1.0));
        let conflicts = detect_conflicts(&p);
        assert!(conflicts.iter().any(|c| c.rule_id == "EQ_BOOST_LIMITING"));
    }

    #[test]
    fn blocking_conflict_makes_parameters_invalid() {
        let p = params(&[("eqBoostMax", 13.0)]);
        let result = validate_parameters(&p);
        assert!(!result.is_valid);
        assert!(result.has_errors);
    }

    #[test]
    fn clean_parameters_have_no_conflicts() {
        let p = params(&[("eqBoostMax", 2.0), ("limiterThreshold", -6.0)]);
        let result = validate_parameters(&p);
        assert!(result.is_valid);
        assert!(!result.has_errors);
        assert!(!result.has_warnings);
    }
}
