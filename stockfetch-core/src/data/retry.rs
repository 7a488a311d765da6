//! Retry budget and backoff schedule for transient provider errors.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff: `base_delay * 2^(retry - 1)`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Add up to 25% random jitter on top of each delay.
    pub jitter: bool,
}

impl BackoffPolicy {
    /// No waiting at all. Handy for tests and fault-injection runs.
    pub fn none() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retry number `retry` (1-based). A provider hint such as
    /// `Retry-After` raises the delay, still bounded by `max_delay`.
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        let mut delay = self
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if let Some(hint) = hint {
            delay = delay.max(hint.min(self.max_delay));
        }

        if self.jitter && !delay.is_zero() {
            let extra = rand::thread_rng().gen_range(0.0..=0.25);
            delay = delay.mul_f64(1.0 + extra).min(self.max_delay);
        }
        delay
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: false,
        }
    }
}

/// How hard to try for each ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a ticker gets `max_retries + 1` attempts.
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}
