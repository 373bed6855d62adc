//! Bounded retry for start-up fixes (GPS home, initial position).

use std::time::Duration;

use serde::Deserialize;

use crate::clock::Clock;

/// Outcome of a fix acquisition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fix<T> {
    Acquired(T),
    NoFix,
}

/// Fixed-backoff retry policy.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts
    pub attempts: u32,
    /// Pause between failed attempts (milliseconds)
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts,
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Try until a value is returned or attempts run out.
    ///
    /// `try_fix` receives the 1-based attempt number. The clock sleeps only
    /// between attempts, never after the last one.
    pub fn acquire<T, C, F>(&self, clock: &mut C, mut try_fix: F) -> Fix<T>
    where
        C: Clock,
        F: FnMut(u32) -> Option<T>,
    {
        for attempt in 1..=self.attempts {
            if let Some(value) = try_fix(attempt) {
                return Fix::Acquired(value);
            }
            if attempt < self.attempts {
                clock.sleep(self.backoff());
            }
        }
        Fix::NoFix
    }
}
