//! Configuration value validation utilities.
//!
//! This module provides comprehensive validation for configuration values,
//! ensuring type safety and constraint compliance.

use crate::error::{SonarGateError, SonarGateResult};

/// Validate a string value against a list of allowed values.
pub fn validate_enum(value: &str, allowed: &[&str]) -> SonarGateResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(SonarGateError::config(format!(
            "Invalid value '{}'. Allowed values: {}",
            value,
            allowed.join(", ")
        )))
    }
}

/// Validate a float value within a specified range.
pub fn validate_float_range(value: &str, min: f32, max: f32) -> SonarGateResult<f32> {
    let parsed = value
        .parse::<f32>()
        .map_err(|_| SonarGateError::config(format!("Invalid float value: {}", value)))?;
    if parsed < min || parsed > max {
        return Err(SonarGateError::config(format!(
            "Value {} is out of range [{}, {}]",
            parsed, min, max
        )));
    }
    Ok(parsed)
}

/// Validate an unsigned integer within a specified range.
pub fn validate_uint_range(value: &str, min: u32, max: u32) -> SonarGateResult<u32> {
    let parsed = value
        .parse::<u32>()
        .map_err(|_| SonarGateError::config(format!("Invalid integer value: {}", value)))?;
    if parsed < min || parsed > max {
        return Err(SonarGateError::config(format!(
            "Value {} is out of range [{}, {}]",
            parsed, min, max
        )));
    }
    Ok(parsed)
}

/// Validate a u64 value within a specified range.
pub fn validate_u64_range(value: &str, min: u64, max: u64) -> SonarGateResult<u64> {
    let parsed = value
        .parse::<u64>()
        .map_err(|_| SonarGateError::config(format!("Invalid u64 value: {}", value)))?;
    if parsed < min || parsed > max {
        return Err(SonarGateError::config(format!(
            "Value {} is out of range [{}, {}]",
            parsed, min, max
        )));
    }
    Ok(parsed)
}

/// Validate a usize value within a specified range.
pub fn validate_usize_range(value: &str, min: usize, max: usize) -> SonarGateResult<usize> {
    let parsed = value
        .parse::<usize>()
        .map_err(|_| SonarGateError::config(format!("Invalid usize value: {}", value)))?;
    if parsed < min || parsed > max {
        return Err(SonarGateError::config(format!(
            "Value {} is out of range [{}, {}]",
            parsed, min, max
        )));
    }
    Ok(parsed)
}

/// Validate URL format.
pub fn validate_url(value: &str) -> SonarGateResult<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(SonarGateError::config(format!(
            "Invalid URL format: {}. Must start with http:// or https://",
            value
        )));
    }
    Ok(())
}

/// Parse boolean value from string.
pub fn parse_bool(value: &str) -> SonarGateResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(SonarGateError::config(format!(
            "Invalid boolean value: {}",
            value
        ))),
    }
}
