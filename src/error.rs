//! Error taxonomy for the analysis and delivery pipeline.
//!
//! `SonarGateError` covers the five taxonomy entries a caller must be able
//! to distinguish (measurement, validation, conflict, job, system) plus the
//! ambient I/O, configuration and catch-all variants every binary needs.
//! Per-analyzer and per-platform failures are caught at their boundaries and
//! turned into report/state fields; they never reach this type except when
//! something above that boundary genuinely cannot continue.
use thiserror::Error;

/// All errors that can surface out of the sonargate library.
#[derive(Error, Debug)]
pub enum SonarGateError {
    /// I/O failure reading/writing assets, temp files, or reports.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// The external measurement tool failed to run or produced output that
    /// could not be parsed against the expected schema. Never fatal to a
    /// pipeline: callers fall back to confidence 0 / neutral status.
    #[error("Measurement error: {message}")]
    Measurement {
        /// Description of the measurement failure.
        message: String,
    },

    /// An asset or its metadata failed a platform's delivery contract.
    #[error("Validation error [{platform}]: {message}")]
    Validation {
        /// Platform whose contract was violated.
        platform: String,
        /// Description of the validation failure.
        message: String,
    },

    /// A parameter set was rejected at BLOCKING conflict severity.
    #[error("Conflict error [{rule_id}]: {message}")]
    Conflict {
        /// Identifier of the conflict rule that fired.
        rule_id: String,
        /// Description of the conflict.
        message: String,
    },

    /// A queued job exhausted its retry budget or failed in a way that
    /// cannot be retried (cancelled mid-pipeline, unknown job id, ...).
    #[error("Job error [{job_id}]: {message}")]
    Job {
        /// Identifier of the job that failed.
        job_id: String,
        /// Description of the job failure.
        message: String,
    },

    /// Process spawn failure, exhausted worker pool, or other environment
    /// failure not attributable to a single job or analyzer.
    #[error("System error: {message}")]
    System {
        /// Description of the system-level failure.
        message: String,
    },

    /// Audio decode/probe/resample failure in the normalizer or an
    /// in-process analyzer.
    #[error("Audio processing error: {message}")]
    AudioProcessing {
        /// Description of the audio processing failure.
        message: String,
    },

    /// Catch-all for conditions not covered by a dedicated variant.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Specialized `Result` type for sonargate operations.
pub type SonarGateResult<T> = Result<T, SonarGateError>;

impl SonarGateError {
    /// Construct a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        SonarGateError::Config {
            message: message.into(),
        }
    }

    /// Construct a measurement error (external tool failure or unparseable
    /// output).
    pub fn measurement<S: Into<String>>(message: S) -> Self {
        SonarGateError::Measurement {
            message: message.into(),
        }
    }

    /// Construct a per-platform validation error.
    pub fn validation<S1: Into<String>, S2: Into<String>>(platform: S1, message: S2) -> Self {
        SonarGateError::Validation {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Construct a parameter-conflict error at BLOCKING severity.
    pub fn conflict<S1: Into<String>, S2: Into<String>>(rule_id: S1, message: S2) -> Self {
        SonarGateError::Conflict {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Construct a job-lifecycle error.
    pub fn job<S1: Into<String>, S2: Into<String>>(job_id: S1, message: S2) -> Self {
        SonarGateError::Job {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    /// Construct a system-level error.
    pub fn system<S: Into<String>>(message: S) -> Self {
        SonarGateError::System {
            message: message.into(),
        }
    }

    /// Construct an audio-processing error.
    pub fn audio_processing<S: Into<String>>(message: S) -> Self {
        SonarGateError::AudioProcessing {
            message: message.into(),
        }
    }

    /// Exit code used by the binary when this error reaches `main`.
    pub fn exit_code(&self) -> i32 {
        match self {
            SonarGateError::Io(_) => 1,
            SonarGateError::Config { .. } => 2,
            SonarGateError::Measurement { .. } => 3,
            SonarGateError::Validation { .. } => 4,
            SonarGateError::Conflict { .. } => 5,
            SonarGateError::Job { .. } => 6,
            SonarGateError::System { .. } => 7,
            SonarGateError::AudioProcessing { .. } => 8,
            SonarGateError::Other(_) => 1,
        }
    }

    /// A message with a remediation hint, suitable for printing to stderr.
    pub fn user_friendly_message(&self) -> String {
        match self {
            SonarGateError::Io(e) => format!("File operation error: {e}"),
            SonarGateError::Config { message } => format!(
                "Configuration error: {message}\nHint: run 'sonargate config --help' for details"
            ),
            SonarGateError::Measurement { message } => format!(
                "Measurement error: {message}\nHint: check the measurement tool path in config"
            ),
            SonarGateError::Validation { platform, message } => {
                format!("Validation error ({platform}): {message}")
            }
            SonarGateError::Conflict { rule_id, message } => format!(
                "Conflict error ({rule_id}): {message}\nHint: run 'sonargate conflicts check' for suggested resolutions"
            ),
            SonarGateError::Job { job_id, message } => {
                format!("Job {job_id} failed: {message}")
            }
            SonarGateError::System { message } => format!("System error: {message}"),
            SonarGateError::AudioProcessing { message } => format!(
                "Audio processing error: {message}\nHint: ensure the asset is a supported format"
            ),
            SonarGateError::Other(err) => {
                format!("Unexpected error: {err}\nHint: please report this issue")
            }
        }
    }
}

impl From<symphonia::core::errors::Error> for SonarGateError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        SonarGateError::audio_processing(err.to_string())
    }
}

impl From<walkdir::Error> for SonarGateError {
    fn from(err: walkdir::Error) -> Self {
        SonarGateError::system(err.to_string())
    }
}

impl From<config::ConfigError> for SonarGateError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => SonarGateError::Config {
                message: format!("configuration source not found: {path}"),
            },
            config::ConfigError::Message(msg) => SonarGateError::Config { message: msg },
            other => SonarGateError::Config {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for SonarGateError {
    fn from(err: serde_json::Error) -> Self {
        SonarGateError::Config {
            message: format!("JSON (de)serialization error: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_roundtrip() {
        let err = SonarGateError::config("missing key");
        assert_eq!(err.to_string(), "Configuration error: missing key");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn conflict_error_exit_code_and_hint() {
        let err = SonarGateError::conflict("EQ_BOOST_LIMITING", "eqBoostMax too high");
        assert_eq!(err.exit_code(), 5);
        assert!(err.user_friendly_message().contains("conflicts check"));
    }

    #[test]
    fn job_error_carries_job_id() {
        let err = SonarGateError::job("j-1", "exceeded max attempts");
        assert!(err.to_string().contains("j-1"));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SonarGateError = io_err.into();
        assert!(matches!(err, SonarGateError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
