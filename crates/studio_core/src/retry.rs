//! Retry policy
//!
//! `max_retries` is the total number of attempts a session may make; the
//! backoff before attempt `n + 1` is `base_delay * backoff_factor^(n - 1)`,
//! capped at `max_delay`.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Number of attempts the orchestrator will make. Never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Backoff to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled.max(0.0))
    }

    /// Every wait the policy would insert if all attempts failed.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts()).map(|attempt| self.delay_for(attempt)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_retries: 8,
            ..Default::default()
        };
        assert_eq!(policy.delay_for(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(10_000));
        assert_eq!(policy.delay_for(60), Duration::from_millis(10_000));
    }

    #[test]
    fn test_zero_retries_still_allows_one_attempt() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(policy.max_attempts(), 1);
        assert!(policy.schedule().is_empty());
    }
}
