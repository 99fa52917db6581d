//! Retry policies for stream jobs.
//!
//! A job type declares its own policy (attempt count plus backoff strategy),
//! so the policy is fixed at enqueue time for everything flowing through a
//! given queue. The worker consults it when a processing attempt fails.

use std::time::Duration;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Constant delay between attempts.
    Fixed { delay_ms: u64 },
    /// Doubling delay starting at `base_ms`, capped at `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Delay before the retry following failed attempt number `attempt`
    /// (zero-based: the first failure is attempt 0).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Backoff::Exponential { base_ms, max_ms } => {
                let delay = base_ms.saturating_mul(2u64.saturating_pow(attempt));
                Duration::from_millis(delay.min(*max_ms))
            }
        }
    }
}

/// Retry policy for a job type: how many total attempts a job gets and how
/// long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first delivery.
    pub max_attempts: u32,
    /// Backoff between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Fixed-delay policy.
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay_ms },
        }
    }

    /// Exponential-backoff policy.
    pub fn exponential(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { base_ms, max_ms },
        }
    }

    /// Whether a job that has already failed `retry_count` times has used up
    /// its attempts.
    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        retry_count.saturating_add(1) >= self.max_attempts
    }

    /// Delay before the retry following failed attempt `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, exponential backoff 1s doubling up to 30s.
    fn default() -> Self {
        Self::exponential(3, 1000, 30_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let policy = RetryPolicy::fixed(3, 10_000);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_progression() {
        let policy = RetryPolicy::exponential(5, 1000, 30_000);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(4000));
        // Capped at max_ms.
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_exhaustion_counts_total_attempts() {
        // max_attempts = 3 means: first delivery plus two retries.
        let policy = RetryPolicy::fixed(3, 1000);
        assert!(!policy.is_exhausted(0));
        assert!(!policy.is_exhausted(1));
        assert!(policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }

    #[test]
    fn test_single_attempt_policy() {
        let policy = RetryPolicy::fixed(1, 1000);
        assert!(policy.is_exhausted(0));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                base_ms: 1000,
                max_ms: 30_000
            }
        );
    }
}
