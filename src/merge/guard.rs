//! Retry and deadline guards for a merge run
//!
//! Both are created once per run and never reset. The orchestrator consults
//! them before each action; either one can end the run first.

use std::time::Duration;
use tokio::time::Instant;

/// Default number of rebase attempts per run
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Stand-in for timeouts too large to add to an `Instant` (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Bounded rebase attempts
///
/// Only rebase triggers count; plain status polls do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempt: u32,
    max: u32,
}

impl RetryPolicy {
    /// Policy allowing `max` attempts
    pub const fn new(max: u32) -> Self {
        Self { attempt: 0, max }
    }

    /// Attempts made so far
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Configured maximum
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Attempts still allowed
    pub const fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.attempt)
    }

    /// Whether no attempt is left
    pub const fn exceeded(&self) -> bool {
        self.attempt >= self.max
    }

    /// Count one attempt and return its 1-based number
    ///
    /// Returns `None` without counting when the budget is spent.
    pub const fn record_attempt(&mut self) -> Option<u32> {
        if self.exceeded() {
            return None;
        }
        self.attempt += 1;
        Some(self.attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Absolute point in time after which a run must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self::starting_at(Instant::now(), timeout)
    }

    /// Deadline `timeout` after `start`
    ///
    /// A timeout past the clock's range never expires in practice.
    pub fn starting_at(start: Instant, timeout: Duration) -> Self {
        Self {
            at: start
                .checked_add(timeout)
                .unwrap_or_else(|| start + FAR_FUTURE),
            timeout,
        }
    }

    /// Configured timeout
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether `now` is past the deadline
    pub fn expired(&self, now: Instant) -> bool {
        now > self.at
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.expired(Instant::now())
    }

    /// Time left at `now`, zero once expired
    pub fn remaining(&self, now: Instant) -> Duration {
        self.at.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_counts_to_max() {
        let mut retries = RetryPolicy::new(2);
        assert_eq!(retries.attempt(), 0);
        assert_eq!(retries.remaining(), 2);
        assert!(!retries.exceeded());

        assert_eq!(retries.record_attempt(), Some(1));
        assert_eq!(retries.record_attempt(), Some(2));
        assert!(retries.exceeded());
        assert_eq!(retries.remaining(), 0);

        // Spent budget is not counted past the maximum
        assert_eq!(retries.record_attempt(), None);
        assert_eq!(retries.attempt(), 2);
    }

    #[test]
    fn test_zero_retries_is_immediately_exceeded() {
        let mut retries = RetryPolicy::new(0);
        assert!(retries.exceeded());
        assert_eq!(retries.record_attempt(), None);
    }

    #[test]
    fn test_default_retries() {
        assert_eq!(RetryPolicy::default().max(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_deadline_expiry() {
        let start = Instant::now();
        let deadline = Deadline::starting_at(start, Duration::from_secs(10));

        assert!(!deadline.expired(start));
        assert!(!deadline.expired(start + Duration::from_secs(10)));
        assert!(deadline.expired(start + Duration::from_secs(11)));
        assert_eq!(
            deadline.remaining(start + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            deadline.remaining(start + Duration::from_secs(30)),
            Duration::ZERO
        );
        assert_eq!(deadline.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_unbounded_timeout_does_not_overflow() {
        let deadline = Deadline::after(Duration::MAX);
        let now = Instant::now();

        assert!(!deadline.is_expired());
        assert!(deadline.remaining(now) > Duration::from_secs(86_400 * 365));
        assert_eq!(deadline.timeout(), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_follows_runtime_clock() {
        let deadline = Deadline::after(Duration::from_secs(5));
        assert!(!deadline.is_expired());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(deadline.is_expired());
    }
}
