//! Shared data model: asset/signal/risk/classification shapes
//! threaded between the analyzers, the decision engine, the queue and the
//! delivery orchestrator. Kept free of behavior — these are the nouns the
//! rest of `core` operates on.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// An immutable description of one audio file for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAsset {
    /// Filesystem path to the asset.
    pub path: PathBuf,
    /// Container/codec name as probed (e.g. "wav", "mp3", "flac").
    pub format: String,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth, in bits (0 for inherently-float or unknown formats).
    pub bit_depth: u16,
    /// Channel count.
    pub channels: u16,
    /// File size in bytes.
    pub file_size: u64,
    /// Duration in seconds.
    pub duration: f64,
    /// Integrated loudness in LUFS, if already known.
    pub loudness: Option<f64>,
}

/// Qualitative description of where the energy in a mix sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixBalance {
    /// Vocal-dominant mix.
    VocalDominant,
    /// Beat/instrumental-dominant mix.
    BeatDominant,
    /// Neither clearly dominant.
    Balanced,
}

/// Measurement-derived scalars, each `[0,1]` unless noted. Any field may be
/// `None` when its underlying measurement failed — this is distinct from a
/// measured-neutral value and must never be silently defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    /// Energy concentration in the 20-60 Hz sub-bass region.
    pub sub_bass_energy: Option<f64>,
    /// Density of detected transients.
    pub transient_density: Option<f64>,
    /// Overall dynamic range signal.
    pub dynamic_range: Option<f64>,
    /// Stereo width signal.
    pub stereo_width: Option<f64>,
    /// Where the mix's energy sits.
    pub mix_balance: Option<MixBalance>,
    /// Vinyl/tape noise floor signal.
    pub vinyl_noise: Option<f64>,
    /// Reverb decay signal.
    pub reverb_decay: Option<f64>,
    /// High-frequency rolloff signal.
    pub high_freq_rolloff: Option<f64>,
    /// General distortion signal.
    pub distortion: Option<f64>,
}

/// Risk scalars named by failure mode. Missing values default to a neutral
/// `0.3` only at the point of aggregation ([`Risks::get_or_neutral`]) —
/// never at parse time, so "not measured" and "measured as neutral" stay
/// distinguishable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risks {
    /// Risk of frequency masking between elements.
    pub masking_risk: Option<f64>,
    /// Risk of clipping under further processing.
    pub clipping_risk: Option<f64>,
    /// Risk of poor translation to consumer playback systems.
    pub translation_risk: Option<f64>,
    /// Risk of stereo-phase collapse to mono.
    pub phase_collapse_risk: Option<f64>,
    /// Risk of audible over-compression.
    pub over_compression_risk: Option<f64>,
    /// Risk that vocals lose intelligibility.
    pub vocal_intelligibility_risk: Option<f64>,
    /// Risk of audible digital artifacts.
    pub artifact_risk: Option<f64>,
    /// Risk that a lo-fi aesthetic reads as a defect rather than a choice.
    pub lofi_aesthetic_risk: Option<f64>,
}

/// The neutral value substituted for a missing risk at aggregation time.
pub const NEUTRAL_RISK: f64 = 0.3;

impl Risks {
    /// Every risk kind, for iteration by weight tables.
    pub const KINDS: [&'static str; 8] = [
        "maskingRisk",
        "clippingRisk",
        "translationRisk",
        "phaseCollapseRisk",
        "overCompressionRisk",
        "vocalIntelligibilityRisk",
        "artifactRisk",
        "lofiAestheticRisk",
    ];

    /// Read a risk by its camelCase name, substituting [`NEUTRAL_RISK`] when
    /// absent. Unknown names also return the neutral value.
    pub fn get_or_neutral(&self, kind: &str) -> f64 {
        let value = match kind {
            "maskingRisk" => self.masking_risk,
            "clippingRisk" => self.clipping_risk,
            "translationRisk" => self.translation_risk,
            "phaseCollapseRisk" => self.phase_collapse_risk,
            "overCompressionRisk" => self.over_compression_risk,
            "vocalIntelligibilityRisk" => self.vocal_intelligibility_risk,
            "artifactRisk" => self.artifact_risk,
            "lofiAestheticRisk" => self.lofi_aesthetic_risk,
            _ => None,
        };
        value.unwrap_or(NEUTRAL_RISK)
    }
}

/// A subgenre label from the external classification vocabulary (e.g.
/// `"TRAP"`, `"DRILL"`, `"BOOM_BAP"`, `"MELODIC"`). Kept as a newtype over
/// `String` rather than a fixed enum so the vocabulary stays data, per the
/// classification engine's external-heuristics-table contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subgenre(pub String);

impl std::fmt::Display for Subgenre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Subgenre {
    fn from(s: &str) -> Self {
        Subgenre(s.to_string())
    }
}

/// Output of subgenre classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Highest-likelihood subgenre.
    pub primary: Subgenre,
    /// Confidence in `primary`, in `[0,1]`.
    pub confidence: f64,
    /// True when confidence fell below the uncertainty threshold.
    pub is_uncertain: bool,
    /// True when the top candidates disagree strongly (ambiguous mix).
    pub conflicting_signals: bool,
    /// Top candidates with their scores, highest first.
    pub top_candidates: Vec<(Subgenre, f64)>,
    /// Full likelihood map over every subgenre in the heuristics table.
    pub likelihoods: HashMap<Subgenre, f64>,
}

/// A single rule's decision during evaluation, before it is (maybe)
/// inserted into a [`ConstraintSet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Identifier of the rule that produced this decision.
    pub rule_id: String,
    /// Human-readable rule name.
    pub name: String,
    /// Constraint name this decision would set.
    pub constraint_name: String,
    /// Constraint value.
    pub value: serde_json::Value,
    /// Why the rule fired.
    pub reason: String,
    /// Whether a later, lower-priority rule may flag this as replaceable.
    pub overrideable: bool,
    /// Evaluation priority; higher runs first.
    pub priority: i32,
}

/// Alias used by rule-engine call sites where "result" reads more naturally
/// than "decision" for the same shape.
pub type RuleResult = Decision;

/// An entry in a [`ConstraintSet`]: the winning decision for one constraint
/// name, first-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintEntry {
    /// The constraint's value.
    pub value: serde_json::Value,
    /// Why this value was chosen.
    pub reason: String,
    /// Rule id that inserted this entry.
    pub source_rule_id: String,
    /// Whether a caller may treat this as non-binding.
    pub overrideable: bool,
}

/// `constraintName -> ConstraintEntry`, insertion-ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintSet {
    entries: Vec<(String, ConstraintEntry)>,
}

impl ConstraintSet {
    /// An empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` under `name` iff `name` is not already present.
    /// Returns `true` if the insert happened.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, entry: ConstraintEntry) -> bool {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| n == &name) {
            return false;
        }
        self.entries.push((name, entry));
        true
    }

    /// Look up a constraint by name.
    pub fn get(&self, name: &str) -> Option<&ConstraintEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Iterate constraints in insertion (priority) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstraintEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Number of constraints set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no constraints have been set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Job kinds processed by the queue engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobType {
    /// Run the analyzer suite.
    Analyze,
    /// Staged processing pipeline (normalize, limit, render, re-analyze).
    Process,
    /// Render one artifact per requested format.
    Export,
    /// Validate against named loudness/technical standards.
    Validate,
    /// Extract, update, or validate metadata.
    Metadata,
}

/// Queue priority. Ordinal order is the dispatch order: `Critical` is
/// serviced before `High`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobPriority {
    /// Serviced first.
    Critical = 0,
    /// Serviced second.
    High = 1,
    /// Serviced third.
    Normal = 2,
    /// Serviced fourth.
    Low = 3,
    /// Serviced last.
    Bulk = 4,
}

impl JobPriority {
    /// All priorities, highest first — the lane polling order.
    pub const ALL: [JobPriority; 5] = [
        JobPriority::Critical,
        JobPriority::High,
        JobPriority::Normal,
        JobPriority::Low,
        JobPriority::Bulk,
    ];
}

/// Job lifecycle state. Transitions are monotonic within a
/// lifecycle except `Retrying -> Queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// Waiting in a priority lane.
    Queued,
    /// Currently executing on a worker.
    Running,
    /// Finished successfully.
    Completed,
    /// Exhausted retries or failed fatally.
    Failed,
    /// Cancelled by the caller.
    Cancelled,
    /// Failed but will be re-queued after a backoff delay.
    Retrying,
}

/// Progress within a job's current `RUNNING` segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Named phase (`queued, analyzing, transforming, finalizing, completed,
    /// failed, cancelled`).
    pub phase: String,
    /// Overall percent complete, `0..=100`, monotonically non-decreasing
    /// within one `RUNNING` segment.
    pub percent: u8,
    /// Human-readable status message.
    pub message: String,
}

/// A unit of queued work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job id.
    pub id: String,
    /// Job kind.
    pub job_type: JobType,
    /// Dispatch priority.
    pub priority: JobPriority,
    /// Current lifecycle state.
    pub state: JobState,
    /// Job-type-specific input payload.
    pub data: serde_json::Value,
    /// Job-type-specific configuration.
    pub config: serde_json::Value,
    /// Attempts made so far.
    pub attempts: u32,
    /// Maximum attempts before giving up.
    pub max_attempts: u32,
    /// Creation time.
    pub created_at: SystemTime,
    /// Last state-change time.
    pub updated_at: SystemTime,
    /// Current progress.
    pub progress: Progress,
    /// Terminal result payload, once `COMPLETED`.
    pub result: Option<serde_json::Value>,
    /// Terminal error message, once `FAILED`.
    pub error: Option<String>,
}

/// Per-analyzer output shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerReport {
    /// Analyzer-specific status label (e.g. `"COMPLIANT"`, `"CRITICAL"`).
    pub status: String,
    /// Overall score in `[0,100]`, when the analyzer produces one.
    pub score: Option<f64>,
    /// Raw measurements backing this report.
    pub measurements: serde_json::Value,
    /// Human-readable summary.
    pub description: String,
    /// Actionable recommendations.
    pub recommendations: Vec<String>,
    /// Confidence in `[0,1]`; `0` whenever a required metric was missing.
    pub confidence: f64,
    /// Wall-clock analysis time in milliseconds.
    pub analysis_time_ms: u64,
}

/// Delivery lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    /// Not yet started.
    Pending,
    /// Running platform validation.
    Validating,
    /// Running required PROCESS jobs.
    Processing,
    /// Uploading to platforms.
    Uploading,
    /// At least one platform succeeded and none requested remain pending.
    Delivered,
    /// Every requested platform failed.
    Failed,
    /// Rejected before any platform work started.
    Rejected,
}

/// Per-platform delivery state within a [`Delivery`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDeliveryState {
    /// This platform's own status.
    pub status: DeliveryStatus,
    /// Error message, if this platform failed.
    pub error: Option<String>,
    /// Upload identifier, once uploaded.
    pub upload_id: Option<String>,
    /// Public URL, once uploaded.
    pub url: Option<String>,
    /// When processing for this platform started.
    pub started_at: Option<SystemTime>,
    /// When processing for this platform finished (success or failure).
    pub completed_at: Option<SystemTime>,
}

/// A delivery request spanning one or more assets and platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Unique delivery id.
    pub id: String,
    /// Assets included in this delivery.
    pub assets: Vec<PathBuf>,
    /// Target platform ids.
    pub platforms: Vec<String>,
    /// Delivery-level metadata (title, artist, ISRC, ...).
    pub metadata: serde_json::Value,
    /// Overall delivery status.
    pub status: DeliveryStatus,
    /// Overall progress.
    pub progress: Progress,
    /// Per-platform state.
    pub per_platform: HashMap<String, PlatformDeliveryState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_risk_defaults_to_neutral_only_on_read() {
        let risks = Risks::default();
        assert!(risks.masking_risk.is_none());
        assert_eq!(risks.get_or_neutral("maskingRisk"), NEUTRAL_RISK);
    }

    #[test]
    fn present_risk_is_not_overridden_by_neutral() {
        let risks = Risks {
            masking_risk: Some(0.9),
            ..Default::default()
        };
        assert_eq!(risks.get_or_neutral("maskingRisk"), 0.9);
    }

    #[test]
    fn constraint_set_is_first_writer_wins() {
        let mut set = ConstraintSet::new();
        let first = ConstraintEntry {
            value: serde_json::json!(1.0),
            reason: "first".into(),
            source_rule_id: "r1".into(),
            overrideable: true,
        };
        let second = ConstraintEntry {
            value: serde_json::json!(2.0),
            reason: "second".into(),
            source_rule_id: "r2".into(),
            overrideable: true,
        };
        assert!(set.insert_if_absent("maxLoudnessIncrease", first));
        assert!(!set.insert_if_absent("maxLoudnessIncrease", second));
        assert_eq!(
            set.get("maxLoudnessIncrease").unwrap().source_rule_id,
            "r1"
        );
    }

    #[test]
    fn job_priority_orders_critical_first() {
        let mut ps = vec![JobPriority::Bulk, JobPriority::Critical, JobPriority::Normal];
        ps.sort();
        assert_eq!(ps[0], JobPriority::Critical);
    }
}
