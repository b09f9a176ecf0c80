//! Bounded retries with deterministic exponential backoff.
//!
//! Every call that crosses the network boundary runs through
//! [`RetryPolicy::execute`]. The delay before attempt `k` (0-indexed) is
//! `min(base * multiplier^(k-1), max)`; the first attempt runs immediately.
//! There is no jitter, so the schedule is reproducible.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the second attempt.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default ceiling on any single delay.
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
/// Default growth factor between delays.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Retry schedule for fallible async operations.
///
/// # Examples
///
/// ```
/// use npa_search::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay in milliseconds before the second attempt.
    pub base_delay_ms: u64,
    /// Upper bound in milliseconds on any single delay.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that runs the operation once with no delay.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Delay to wait before the 0-indexed `attempt`. Attempt 0 never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = self.backoff_multiplier.powi(attempt as i32 - 1);
        let delay = (self.base_delay_ms as f64 * exp).min(self.max_delay_ms as f64);
        Duration::from_millis(delay.max(0.0) as u64)
    }

    /// The delays preceding attempts `1..max_attempts`.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }

    /// Run `operation` until it succeeds or attempts are exhausted.
    ///
    /// On exhaustion the error from the final attempt is returned as-is.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_when(operation, |_| true).await
    }

    /// Like [`execute`](Self::execute), but stops as soon as `should_retry`
    /// rejects an error.
    pub async fn execute_when<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let delay = self.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::trace!(attempt = attempt + 1, attempts, "attempt starting");

            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= attempts {
                        tracing::warn!(attempts, error = %err, "all attempts failed");
                        return Err(err);
                    }
                    if !should_retry(&err) {
                        tracing::debug!(attempt, error = %err, "error is not retryable");
                        return Err(err);
                    }
                    tracing::warn!(
                        attempt,
                        attempts,
                        retry_in_ms = self.delay_for_attempt(attempt).as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                }
            }
        }
    }
}
