//! External-tool invoker.
//!
//! Spawns the external spectral/loudness measurement binary, captures its
//! diagnostic output, and parses it against the line-oriented schema in
//! [`schema`] and the `t:`/`M:`/`S:` time-series format in [`timeseries`].
//! The tool is treated as a black box: a non-zero exit or a timeout is an
//! error carrying the captured stderr, never a panic. Callers (the
//! analyzers) convert a measurement failure into `confidence = 0` and their
//! analyzer's neutral status rather than propagating it.

pub mod process;
pub mod schema;
pub mod timeseries;

use std::time::Duration;

use crate::error::{SonarGateError, SonarGateResult};

pub use process::ToolOutput;
pub use schema::MetricSchema;
pub use timeseries::TimeSeriesPoint;

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A parsed measurement: scalar metrics plus any time-series readings.
#[derive(Debug, Clone, Default)]
pub struct Measurement {
    /// Scalar metrics keyed by schema field name; `None` means the metric
    /// was not present in the tool's output (never defaulted here).
    pub metrics: std::collections::HashMap<String, Option<f64>>,
    /// Ordered `t/M/S` readings, if the tool emitted a time series.
    pub time_series: Vec<TimeSeriesPoint>,
}

/// Thin wrapper bundling a tool path and timeout, used by analyzers that
/// need to run the external binary.
#[derive(Debug, Clone)]
pub struct Invoker {
    tool_path: String,
    timeout: Duration,
}

impl Invoker {
    /// Create an invoker targeting `tool_path` with the given timeout.
    pub fn new(tool_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tool_path: tool_path.into(),
            timeout,
        }
    }

    /// Run the tool with `args`, then parse its stderr against `schema`.
    /// A spawn failure or timeout is fatal to this call only; the returned
    /// error carries any captured stderr via its message.
    pub async fn measure(
        &self,
        args: &[String],
        schema: &MetricSchema,
    ) -> SonarGateResult<Measurement> {
        let output = process::run(&self.tool_path, args, self.timeout).await?;
        let metrics = schema::parse_metrics(&output.stderr, schema);
        let time_series = timeseries::parse_time_series(&output.stderr);
        Ok(Measurement {
            metrics,
            time_series,
        })
    }
}

/// Convert any error into the measurement taxonomy entry (never fatal to
/// the surrounding analyzer pipeline; callers log and fall back).
pub fn to_measurement_error(err: impl std::fmt::Display) -> SonarGateError {
    SonarGateError::measurement(err.to_string())
}
