//! Minimum spacing between outbound provider requests.
//!
//! One limiter is created per run and shared by reference with every worker,
//! so the spacing holds no matter which thread issues the request.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Earliest instant the next request may go out.
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the caller may issue a request. Returns how long it waited.
    ///
    /// The slot is reserved under the lock and the sleep happens after it is
    /// released, so concurrent callers queue up one interval apart.
    pub fn acquire(&self) -> Duration {
        if self.min_interval.is_zero() {
            return Duration::ZERO;
        }

        let wait = {
            let mut next = self
                .next_slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            // an interval too large to represent spaces nothing
            *next = Some(slot.checked_add(self.min_interval).unwrap_or(slot));
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        wait
    }
}

impl Default for RateLimiter {
    /// 500 ms between requests.
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}
