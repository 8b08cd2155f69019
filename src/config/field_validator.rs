//! Dotted-key field validation for `sonargate config set <key> <value>`.
//!
//! Each recognized key maps to a parse + range/enum check, so the CLI can
//! validate a single field without loading the whole `Config` through serde.

use crate::config::validation::{validate_u64_range, validate_uint_range, validate_usize_range};
use crate::error::{SonarGateError, SonarGateResult};

/// Validate a `section.field` key/value pair before it is written back into
/// the config file. Unknown keys are rejected rather than silently accepted.
pub fn validate_field(key: &str, value: &str) -> SonarGateResult<()> {
    match key {
        "general.worker_pool_size" => validate_usize_range(value, 1, 256).map(|_| ()),
        "general.default_job_timeout_secs" => validate_u64_range(value, 0, 24 * 3600).map(|_| ()),
        "queue.retry_base_delay_secs" => validate_u64_range(value, 1, 3600).map(|_| ()),
        "queue.default_max_attempts" => validate_uint_range(value, 1, 20).map(|_| ()),
        "invoker.tool_path" => {
            if value.trim().is_empty() {
                Err(SonarGateError::config("invoker.tool_path cannot be empty"))
            } else {
                Ok(())
            }
        }
        "invoker.timeout_secs" => validate_u64_range(value, 1, 600).map(|_| ()),
        "normalizer.sweep_interval_secs" => validate_u64_range(value, 10, 86_400).map(|_| ()),
        "normalizer.max_temp_file_age_secs" => validate_u64_range(value, 60, 604_800).map(|_| ()),
        "normalizer.temp_dir"
        | "platforms.contract_table_path"
        | "platforms.heuristics_table_path" => Ok(()),
        _ => Err(SonarGateError::config(format!("unknown config key: {key}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_key_in_range() {
        assert!(validate_field("general.worker_pool_size", "4").is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(validate_field("general.worker_pool_size", "0").is_err());
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(validate_field("general.nonexistent", "1").is_err());
    }

    #[test]
    fn rejects_empty_tool_path() {
        assert!(validate_field("invoker.tool_path", "   ").is_err());
    }
}
