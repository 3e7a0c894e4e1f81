//! Retry and timeout policy for the admission protocol.

use std::time::Duration;

use rand::Rng;

/// Retry policy for transient store failures.
///
/// Exponential backoff with jitter:
/// `delay = min(initial_delay * multiplier^attempt, max_delay) * (0.5 + random(0.5))`
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    max_attempts: u32,
    /// Delay before the first retry.
    initial_delay: Duration,
    /// Upper bound on any single delay.
    max_delay: Duration,
    /// Growth factor between consecutive delays.
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Create a retry policy with the admission defaults.
    ///
    /// Defaults:
    /// - `max_attempts`: 5
    /// - `initial_delay`: 20 ms
    /// - `max_delay`: 500 ms
    /// - `backoff_multiplier`: 2.0
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        }
    }

    /// Set maximum attempts. Values below one are treated as one.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay to wait after the given failed attempt (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped_secs = base_secs.min(self.max_delay.as_secs_f64()).max(0.0);

        let jitter = rand::rng().random_range(0.5..=1.0);
        Duration::from_secs_f64(capped_secs * jitter)
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `attempts_made` attempts.
    #[must_use]
    pub const fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// How hard `admit` tries before giving up.
#[derive(Debug, Clone, Default)]
pub struct AdmissionPolicy {
    /// Bounded retry of the unit of work on transient store failures.
    pub retry: RetryPolicy,
    /// Upper bound on the whole call, backoff included. `None` waits for
    /// the store indefinitely.
    pub timeout: Option<Duration>,
}

impl AdmissionPolicy {
    /// Builder-style timeout setter.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
