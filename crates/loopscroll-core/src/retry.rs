#![forbid(unsafe_code)]

//! Bounded retry schedule for late-mounting layout.
//!
//! Spacer buffers can report zero height until the page has settled. The
//! session re-measures on a short, bounded schedule instead of polling.
//! Delays follow a fixed linear formula (no jitter) so simulated sessions
//! replay identically.

use web_time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Linear backoff: `base_ms * (attempt + 1)`, capped at `max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RetryPolicy {
    /// Number of re-measurements after the initial one. `0` disables retries.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_ms: 100,
            max_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts,
            base_ms,
            max_ms,
        }
    }

    /// Never retry.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(0, 0, 0)
    }

    /// Delay before the given retry (0-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.base_ms.saturating_mul(u64::from(attempt) + 1);
        Duration::from_millis(delay.min(self.max_ms))
    }

    /// Whether the given retry (0-indexed) is still allowed.
    #[must_use]
    pub const fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Sum of all delays, i.e. the longest the session waits for layout.
    #[must_use]
    pub fn total_max_delay(&self) -> Duration {
        (0..self.max_attempts).map(|i| self.delay(i)).sum()
    }
}
