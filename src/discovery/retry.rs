//! Retry strategies for bulk writes
//!
//! Retrying a whole batch is safe because every document is keyed by
//! its locator; a resubmitted document overwrites itself.

use std::time::Duration;

use crate::discovery::error::DiscoveryError;

/// Decides whether and when a failed call is attempted again
pub trait RetryPolicy: Send + Sync {
    /// Delay before retry number `attempt` (1-based), or `None` to give up
    fn backoff(&self, attempt: u32, err: &DiscoveryError) -> Option<Duration>;
}

/// Never retry. Failures go straight to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn backoff(&self, _attempt: u32, _err: &DiscoveryError) -> Option<Duration> {
        None
    }
}

/// Retry retryable errors up to `max_retries` times, doubling the wait
/// each time: `base_delay`, `2 * base_delay`, `4 * base_delay`, ...
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl ExponentialBackoff {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn backoff(&self, attempt: u32, err: &DiscoveryError) -> Option<Duration> {
        if attempt > self.max_retries || !err.is_retryable() {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.base_delay.saturating_mul(factor))
    }
}
