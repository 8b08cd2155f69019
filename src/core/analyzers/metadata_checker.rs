//! Metadata Checker analyzer: validates tag completeness
//! against a field dictionary with per-field requirement levels, applies
//! cross-field rules, and rolls the result up into per-platform readiness.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::{Analyzer, AnalyzerOptions, CompactReport, Severity};
use crate::core::types::AnalyzerReport;
use crate::error::SonarGateResult;

/// Neutral status when no metadata map is available at all.
pub const NEUTRAL_STATUS: &str = "UNKNOWN";

/// How strongly a field is expected to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRequirement {
    /// Delivery should be blocked without it.
    Required,
    /// Strongly encouraged but not blocking.
    Recommended,
    /// Nice to have.
    Optional,
}

/// A dictionary entry: field name plus its requirement level.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Tag field name.
    pub name: &'static str,
    /// Requirement level.
    pub requirement: FieldRequirement,
}

/// The built-in metadata field dictionary.
pub const FIELD_DICTIONARY: &[FieldSpec] = &[
    FieldSpec { name: "title", requirement: FieldRequirement::Required },
    FieldSpec { name: "artist", requirement: FieldRequirement::Required },
    FieldSpec { name: "album", requirement: FieldRequirement::Required },
    FieldSpec { name: "isrc", requirement: FieldRequirement::Required },
    FieldSpec { name: "genre", requirement: FieldRequirement::Recommended },
    FieldSpec { name: "release_date", requirement: FieldRequirement::Recommended },
    FieldSpec { name: "label", requirement: FieldRequirement::Recommended },
    FieldSpec { name: "composer", requirement: FieldRequirement::Optional },
    FieldSpec { name: "explicit", requirement: FieldRequirement::Recommended },
    FieldSpec { name: "upc", requirement: FieldRequirement::Optional },
];

/// Severity of a single metadata issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    /// Informational only.
    Info,
    /// Worth fixing.
    Warning,
    /// Should be fixed before delivery.
    Error,
    /// Delivery will be rejected without it.
    Critical,
}

impl IssueSeverity {
    /// Map to the shared severity ladder.
    pub fn to_severity(self) -> Severity {
        match self {
            IssueSeverity::Info => Severity::None,
            IssueSeverity::Warning => Severity::Low,
            IssueSeverity::Error => Severity::Moderate,
            IssueSeverity::Critical => Severity::Critical,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            IssueSeverity::Info => "INFO",
            IssueSeverity::Warning => "WARNING",
            IssueSeverity::Error => "ERROR",
            IssueSeverity::Critical => "CRITICAL",
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct MetadataIssue {
    /// Field the issue concerns (empty for cross-field issues).
    pub field: String,
    /// Issue severity.
    pub severity: IssueSeverity,
    /// Human-readable description.
    pub message: String,
}

/// Per-platform readiness, after weighing missing-field severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// All required and recommended fields present.
    Complete,
    /// All required fields present, some recommended missing.
    Partial,
    /// Some required fields missing, but not all.
    Incomplete,
    /// No usable metadata.
    Missing,
}

impl Readiness {
    fn as_str(self) -> &'static str {
        match self {
            Readiness::Complete => "COMPLETE",
            Readiness::Partial => "PARTIAL",
            Readiness::Incomplete => "INCOMPLETE",
            Readiness::Missing => "MISSING",
        }
    }
}

fn field_present(fields: &HashMap<String, String>, name: &str) -> bool {
    fields.get(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Validate `fields` against [`FIELD_DICTIONARY`] plus a small set of
/// cross-field rules, and compute overall readiness.
pub fn check_metadata(fields: &HashMap<String, String>) -> (Vec<MetadataIssue>, Readiness) {
    if fields.is_empty() {
        return (
            vec![MetadataIssue {
                field: String::new(),
                severity: IssueSeverity::Critical,
                message: "no metadata present".to_string(),
            }],
            Readiness::Missing,
        );
    }

    let mut issues = Vec::new();
    let mut missing_required = 0usize;
    let mut missing_recommended = 0usize;
    let mut required_count = 0usize;

    for spec in FIELD_DICTIONARY {
        let present = field_present(fields, spec.name);
        match spec.requirement {
            FieldRequirement::Required => {
                required_count += 1;
                if !present {
                    missing_required += 1;
                    issues.push(MetadataIssue {
                        field: spec.name.to_string(),
                        severity: IssueSeverity::Critical,
                        message: format!("required field '{}' is missing", spec.name),
                    });
                }
            }
            FieldRequirement::Recommended => {
                if !present {
                    missing_recommended += 1;
                    issues.push(MetadataIssue {
                        field: spec.name.to_string(),
                        severity: IssueSeverity::Warning,
                        message: format!("recommended field '{}' is missing", spec.name),
                    });
                }
            }
            FieldRequirement::Optional => {}
        }
    }

    // Cross-field rule: an explicit flag of "true" without a corresponding
    // clean/parental-advisory note is a warning, not a hard failure.
    if fields.get("explicit").map(|v| v == "true").unwrap_or(false)
        && !fields.contains_key("parental_advisory")
    {
        issues.push(MetadataIssue {
            field: "parental_advisory".to_string(),
            severity: IssueSeverity::Warning,
            message: "explicit flag set without a parental advisory note".to_string(),
        });
    }

    // Cross-field rule: ISRC format sanity (12 alphanumeric characters).
    if let Some(isrc) = fields.get("isrc") {
        let compact: String = isrc.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
        if !compact.is_empty() && (compact.len() != 12 || !compact.chars().all(|c| c.is_ascii_alphanumeric())) {
            issues.push(MetadataIssue {
                field: "isrc".to_string(),
                severity: IssueSeverity::Error,
                message: "ISRC does not match the 12-character alphanumeric format".to_string(),
            });
        }
    }

    let readiness = if missing_required == required_count && required_count > 0 {
        Readiness::Missing
    } else if missing_required > 0 {
        Readiness::Incomplete
    } else if missing_recommended > 0 {
        Readiness::Partial
    } else {
        Readiness::Complete
    };

    (issues, readiness)
}

fn build_report(fields: &HashMap<String, String>) -> AnalyzerReport {
    let (issues, readiness) = check_metadata(fields);
    let worst = issues.iter().map(|i| i.severity).max().unwrap_or(IssueSeverity::Info);

    let recommendations = issues
        .iter()
        .filter(|i| matches!(i.severity, IssueSeverity::Error | IssueSeverity::Critical))
        .map(|i| i.message.clone())
        .collect();

    AnalyzerReport {
        status: readiness.as_str().to_string(),
        score: Some(match readiness {
            Readiness::Complete => 100.0,
            Readiness::Partial => 80.0,
            Readiness::Incomplete => 40.0,
            Readiness::Missing => 0.0,
        }),
        measurements: serde_json::json!({
            "readiness": readiness.as_str(),
            "issues": issues.iter().map(|i| serde_json::json!({
                "field": i.field,
                "severity": i.severity.as_str(),
                "message": i.message,
            })).collect::<Vec<_>>(),
        }),
        description: format!("{} issue(s), worst severity {}", issues.len(), worst.as_str()),
        recommendations,
        confidence: 1.0,
        analysis_time_ms: 0,
    }
}

/// The metadata checker analyzer. Unlike the other analyzers, it has no
/// external tool to invoke: it operates purely on a pre-extracted tag map.
pub struct MetadataCheckerAnalyzer;

#[async_trait]
impl Analyzer for MetadataCheckerAnalyzer {
    type Metrics = HashMap<String, String>;

    async fn analyze(&self, _path: &Path, _options: &AnalyzerOptions) -> SonarGateResult<AnalyzerReport> {
        Ok(super::neutral_report(
            NEUTRAL_STATUS,
            "metadata checker requires pre-extracted tags via classify()",
        ))
    }

    fn quick_check(&self, _path: &Path) -> SonarGateResult<CompactReport> {
        Ok(CompactReport {
            status: NEUTRAL_STATUS.to_string(),
            score: None,
        })
    }

    fn classify(&self, fields: &HashMap<String, String>) -> AnalyzerReport {
        build_report(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_fields() -> HashMap<String, String> {
        [
            ("title", "Example"),
            ("artist", "Example Artist"),
            ("album", "Example Album"),
            ("isrc", "USRC17607839"),
            ("genre", "House"),
            ("release_date", "2026-01-01"),
            ("label", "Example Label"),
            ("explicit", "false"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn complete_metadata_is_complete() {
        let (issues, readiness) = check_metadata(&complete_fields());
        assert!(issues.is_empty());
        assert_eq!(readiness, Readiness::Complete);
    }

    #[test]
    fn missing_required_field_is_incomplete() {
        let mut fields = complete_fields();
        fields.remove("isrc");
        let (issues, readiness) = check_metadata(&fields);
        assert_eq!(readiness, Readiness::Incomplete);
        assert!(issues.iter().any(|i| i.field == "isrc" && i.severity == IssueSeverity::Critical));
    }

    #[test]
    fn explicit_without_advisory_warns() {
        let mut fields = complete_fields();
        fields.insert("explicit".to_string(), "true".to_string());
        let (issues, _readiness) = check_metadata(&fields);
        assert!(issues.iter().any(|i| i.field == "parental_advisory"));
    }

    #[test]
    fn malformed_isrc_is_an_error() {
        let mut fields = complete_fields();
        fields.insert("isrc".to_string(), "not-an-isrc".to_string());
        let (issues, _readiness) = check_metadata(&fields);
        assert!(issues.iter().any(|i| i.field == "isrc" && i.severity == IssueSeverity::Error));
    }

    #[test]
    fn empty_metadata_is_missing() {
        let (_issues, readiness) = check_metadata(&HashMap::new());
        assert_eq!(readiness, Readiness::Missing);
    }
}
