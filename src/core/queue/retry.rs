//! Exponential-backoff retry delay. The queue engine doesn't retry a
//! closure in place — a failed job is re-enqueued with an incremented
//! attempt count instead — so only the delay computation lives here, not a
//! retry loop.

use std::time::Duration;

/// Delay before a job's next attempt, given its 1-based `attempts` count so
/// far. `attempts = 1` (the first failure) yields `base_secs` exactly;
/// each subsequent attempt doubles it.
pub fn retry_delay(base_secs: u64, attempts: u32) -> Duration {
    let exponent = attempts.saturating_sub(1);
    let secs = (base_secs as f64) * 2f64.powi(exponent as i32);
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_uses_the_base_delay() {
        assert_eq!(retry_delay(5, 1), Duration::from_secs(5));
    }

    #[test]
    fn delay_doubles_each_attempt() {
        assert_eq!(retry_delay(5, 2), Duration::from_secs(10));
        assert_eq!(retry_delay(5, 3), Duration::from_secs(20));
        assert_eq!(retry_delay(5, 4), Duration::from_secs(40));
    }

    #[test]
    fn zero_attempts_still_yields_the_base_delay() {
        assert_eq!(retry_delay(5, 0), Duration::from_secs(5));
    }
}
