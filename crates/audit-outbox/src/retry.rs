//! Backoff between direct-send attempts.

use crate::ClientConfig;
use std::time::Duration;

/// Linear retry policy.
///
/// The delay before retry `n` (0-based) is `base_delay * (n + 1)`, with no
/// jitter and no cap. At most `max_retries + 1` sends are made in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff unit.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_delay())
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Whether another attempt may follow failed attempt `attempt`.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Upper bound on sends for one payload.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));

        assert_eq!(policy.delay(0), Duration::from_millis(1000));
        assert_eq!(policy.delay(1), Duration::from_millis(2000));
        assert_eq!(policy.delay(2), Duration::from_millis(3000));
        assert_eq!(policy.delay(9), Duration::from_millis(10_000));
    }

    #[test]
    fn test_should_retry_bound() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert_eq!(policy.total_attempts(), 4);
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert!(!policy.should_retry(0));
        assert_eq!(policy.total_attempts(), 1);
    }

    #[test]
    fn test_large_attempt_saturates() {
        let policy = RetryPolicy::new(u32::MAX, Duration::MAX);
        assert_eq!(policy.delay(u32::MAX), Duration::MAX);
        assert_eq!(policy.total_attempts(), u32::MAX);
    }

    #[test]
    fn test_default_matches_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
    }
}
