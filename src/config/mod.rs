//! Application configuration.
//!
//! A single `Config` struct loaded through the `config` crate: defaults,
//! then an optional file (`sonargate.toml` in the current directory or
//! `$XDG_CONFIG_HOME/sonargate/config.toml`), then `SONARGATE_*` environment
//! variables, then CLI overrides applied by the caller. A single pass over
//! these sources is enough here: nothing needs to round-trip a partial
//! merge back into an interactive config editor.

pub mod field_validator;
pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{SonarGateError, SonarGateResult};

/// Worker-pool sizing and global timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Number of concurrent queue workers. Defaults to `max(1, cpus - 1)`.
    pub worker_pool_size: usize,
    /// Default per-job timeout in seconds; `0` means no timeout.
    pub default_job_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: num_cpus::get().saturating_sub(1).max(1),
            default_job_timeout_secs: 0,
        }
    }
}

/// Job queue retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Base retry delay in seconds; actual delay is `base * 2^(attempts-1)`.
    pub retry_base_delay_secs: u64,
    /// Default `maxAttempts` applied to jobs that don't set their own.
    pub default_max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            retry_base_delay_secs: 5,
            default_max_attempts: 3,
        }
    }
}

/// External measurement tool invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Path to the measurement binary (e.g. `ffmpeg`).
    pub tool_path: String,
    /// Per-invocation timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            tool_path: "ffmpeg".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Pre-analysis normalizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Directory for normalized temp copies.
    pub temp_dir: PathBuf,
    /// Interval between background sweeps, in seconds.
    pub sweep_interval_secs: u64,
    /// Age threshold for sweep deletion, in seconds.
    pub max_temp_file_age_secs: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("sonargate"),
            sweep_interval_secs: 600,
            max_temp_file_age_secs: 3600,
        }
    }
}

/// Delivery platform table location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformsConfig {
    /// Path to the platform contract table (TOML). `None` uses the
    /// built-in defaults in `core::delivery::platforms`.
    pub contract_table_path: Option<PathBuf>,
    /// Path to the subgenre heuristics table (TOML/JSON). `None` uses the
    /// built-in defaults in `core::classification::heuristics`.
    pub heuristics_table_path: Option<PathBuf>,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            contract_table_path: None,
            heuristics_table_path: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General/worker pool settings.
    pub general: GeneralConfig,
    /// Job queue retry settings.
    pub queue: QueueConfig,
    /// External-tool invoker settings.
    pub invoker: InvokerConfig,
    /// Pre-analysis normalizer settings.
    pub normalizer: NormalizerConfig,
    /// Delivery/platform table settings.
    pub platforms: PlatformsConfig,
}

impl Config {
    /// Load configuration from defaults, an optional config file, and
    /// `SONARGATE_*` environment variables, in that priority order.
    pub fn load() -> SonarGateResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SONARGATE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the config file path `load()` reads from (and `config set`
    /// writes to): `./sonargate.toml` if present, else the XDG config path.
    pub fn default_config_path() -> Option<PathBuf> {
        let local = PathBuf::from("sonargate.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir().map(|d| d.join("sonargate").join("config.toml"))
    }

    /// Validate cross-field invariants not expressible via serde defaults.
    pub fn validate(&self) -> SonarGateResult<()> {
        if self.general.worker_pool_size == 0 {
            return Err(SonarGateError::config(
                "general.worker_pool_size must be greater than 0",
            ));
        }
        if self.queue.retry_base_delay_secs == 0 {
            return Err(SonarGateError::config(
                "queue.retry_base_delay_secs must be greater than 0",
            ));
        }
        if self.invoker.tool_path.trim().is_empty() {
            return Err(SonarGateError::config("invoker.tool_path cannot be empty"));
        }
        if self.invoker.timeout_secs == 0 {
            return Err(SonarGateError::config(
                "invoker.timeout_secs must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_worker_pool_rejected() {
        let mut cfg = Config::default();
        cfg.general.worker_pool_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_tool_path_rejected() {
        let mut cfg = Config::default();
        cfg.invoker.tool_path = "  ".to_string();
        assert!(cfg.validate().is_err());
    }
}
