//! Per-platform delivery contract table, loaded the same way as the
//! subgenre heuristics table (external TOML, falling back to a built-in
//! default). The validator and orchestrator only ever read this table,
//! never write it. Distinct from [`crate::core::analyzers::platform_targets`],
//! which covers loudness targets alone.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SonarGateError, SonarGateResult};

/// One platform's technical delivery contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformContract {
    /// Platform identifier, e.g. `"spotify"`.
    pub id: String,
    /// Metadata field names this platform requires present.
    pub required_metadata: Vec<String>,
    /// Accepted container/codec formats, e.g. `["wav", "flac"]`.
    pub formats: Vec<String>,
    /// Minimum accepted bit depth.
    pub min_bit_depth: u16,
    /// Minimum accepted sample rate, in Hz.
    pub min_sample_rate: u32,
    /// Maximum accepted file size, in bytes.
    pub max_file_size_bytes: u64,
    /// Target integrated loudness, in LUFS.
    pub loudness_target_lufs: f64,
    /// Acceptable deviation from the target, in LU.
    pub loudness_tolerance_lu: f64,
}

/// The full set of platform contracts known to the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformTable {
    /// Contracts, one per platform.
    pub platforms: Vec<PlatformContract>,
}

impl PlatformTable {
    /// Load a table from a TOML file.
    pub fn load(path: &Path) -> SonarGateResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| SonarGateError::config(format!("invalid platform contract table: {e}")))
    }

    /// The built-in table used when no external path is configured.
    pub fn built_in() -> Self {
        Self {
            platforms: vec![
                PlatformContract {
                    id: "spotify".to_string(),
                    required_metadata: vec!["title".to_string(), "artist".to_string(), "isrc".to_string()],
                    formats: vec!["wav".to_string(), "flac".to_string()],
                    min_bit_depth: 16,
                    min_sample_rate: 44_100,
                    max_file_size_bytes: 1_000 * 1024 * 1024,
                    loudness_target_lufs: -14.0,
                    loudness_tolerance_lu: 1.0,
                },
                PlatformContract {
                    id: "apple_music".to_string(),
                    required_metadata: vec![
                        "title".to_string(),
                        "artist".to_string(),
                        "album".to_string(),
                        "isrc".to_string(),
                    ],
                    formats: vec!["wav".to_string(), "aiff".to_string()],
                    min_bit_depth: 24,
                    min_sample_rate: 44_100,
                    max_file_size_bytes: 2_000 * 1024 * 1024,
                    loudness_target_lufs: -16.0,
                    loudness_tolerance_lu: 1.0,
                },
                PlatformContract {
                    id: "ebu_broadcast".to_string(),
                    required_metadata: vec!["title".to_string(), "artist".to_string()],
                    formats: vec!["wav".to_string()],
                    min_bit_depth: 24,
                    min_sample_rate: 48_000,
                    max_file_size_bytes: 4_000 * 1024 * 1024,
                    loudness_target_lufs: -23.0,
                    loudness_tolerance_lu: 0.5,
                },
            ],
        }
    }

    /// Look up a contract by platform id.
    pub fn find(&self, id: &str) -> Option<&PlatformContract> {
        self.platforms.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_has_spotify() {
        let table = PlatformTable::built_in();
        assert!(table.find("spotify").is_some());
    }

    #[test]
    fn unknown_platform_returns_none() {
        let table = PlatformTable::built_in();
        assert!(table.find("nonexistent").is_none());
    }
}
