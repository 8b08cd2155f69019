//! Parser for the tool's `t: <time> M: <momentary> S: <short-term>` lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// One time-series reading: wall-clock offset plus momentary/short-term
/// loudness at that instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    /// Seconds from the start of the measurement.
    pub t: f64,
    /// Momentary loudness (400 ms window), in LUFS.
    pub m: f64,
    /// Short-term loudness (3 s window), in LUFS.
    pub s: f64,
}

static LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)t:\s*(-?\d+(?:\.\d+)?)\s+M:\s*(-?\d+(?:\.\d+)?)\s+S:\s*(-?\d+(?:\.\d+)?)")
        .expect("invalid time-series regex")
});

/// Extract every `t/M/S` reading from `stderr`, in the order they appear.
/// Readings are expected wall-clock ordered by the tool already; this does
/// not re-sort, only parses.
pub fn parse_time_series(stderr: &str) -> Vec<TimeSeriesPoint> {
    let mut points = Vec::new();
    for line in stderr.lines() {
        if let Some(caps) = LINE.captures(line) {
            let parse = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
            if let (Some(t), Some(m), Some(s)) = (parse(1), parse(2), parse(3)) {
                points.push(TimeSeriesPoint { t, m, s });
            }
        }
    }
    points
}

/// True iff `points` has non-decreasing `t`, the invariant callers of
/// `parse_time_series` rely on.
pub fn is_monotonic(points: &[TimeSeriesPoint]) -> bool {
    points.windows(2).all(|w| w[0].t <= w[1].t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
t: 0.1 M: -20.1 S: -19.8
some unrelated diagnostic line
t: 0.5 M: -18.4 S: -17.9
t: 1.0 M: -15.0 S: -16.2
";

    #[test]
    fn parses_ordered_triples() {
        let points = parse_time_series(FIXTURE);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], TimeSeriesPoint { t: 0.5, m: -18.4, s: -17.9 });
        assert!(is_monotonic(&points));
    }

    #[test]
    fn ignores_unrelated_lines() {
        let points = parse_time_series("nothing to see here\n");
        assert!(points.is_empty());
    }

    #[test]
    fn detects_non_monotonic_input() {
        let points = vec![
            TimeSeriesPoint { t: 1.0, m: 0.0, s: 0.0 },
            TimeSeriesPoint { t: 0.5, m: 0.0, s: 0.0 },
        ];
        assert!(!is_monotonic(&points));
    }
}
