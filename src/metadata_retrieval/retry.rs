//! Rate-limit retry policy for catalog requests
//!
//! TVMaze answers `429 Too Many Requests` when a client exceeds its request
//! budget. Only that status is retried; everything else reaches the caller
//! on the first attempt.

use backoff::ExponentialBackoff;
use std::time::Duration;

/// How often and how patiently a rate-limited request is repeated
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Upper bound for a single delay
    pub max_interval: Duration,
    /// Factor applied to the delay after every retry
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Creates the back-off schedule for one request
    ///
    /// Delays are not randomized and the total elapsed time is not capped;
    /// `max_attempts` alone ends the retries.
    pub fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: self.max_interval,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Returns true if another attempt may follow the given 1-based attempt
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    #[test]
    fn test_default_policy_backs_off_exponentially() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.to_backoff();

        let delays: Vec<_> = (0..5).filter_map(|_| backoff.next_backoff()).collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
                Duration::from_secs(30),
            ]
        );
    }

    #[test]
    fn test_default_policy_attempt_limit() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry_after(4));
        assert!(!policy.allows_retry_after(5));
    }

    #[test]
    fn test_none_policy_never_retries() {
        assert!(!RetryPolicy::none().allows_retry_after(1));
    }
}
