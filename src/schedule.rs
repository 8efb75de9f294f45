//! Throttle and debounce on an explicit clock.
//!
//! Both types are passive state machines: the owner passes `now` into every
//! call and asks for the next deadline, so an event loop can sleep until it
//! and tests can drive time by hand. Each holds one "last pending call" slot;
//! a newer call replaces whatever was waiting.
//!
//! ```text
//! throttle (250ms):  calls  x  x x x x x x x          x
//!                    fires  x     x     x     x(last)  x
//!
//! debounce (250ms):  calls  x  x x x x x x x          x
//!                    fires                    x(last)     x
//! ```

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Fires at most once per interval, always delivering the latest value last.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    last_fire: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
            pending: None,
        }
    }

    /// Offer a value. Returns it straight back if the window is open (leading
    /// edge); otherwise parks it as the pending trailing call.
    pub fn call(&mut self, value: T, now: Instant) -> Option<T> {
        match self.last_fire {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.pending = Some(value);
                None
            }
            _ => {
                self.last_fire = Some(now);
                self.pending = None;
                Some(value)
            }
        }
    }

    /// Release the pending value once its window has closed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_fire = Some(now);
        self.pending.take()
    }

    /// When the pending trailing call becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_fire.map(|last| last + self.interval)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Fires only once calls have stopped for a full interval.
#[derive(Debug)]
pub struct Debounce<T> {
    interval: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    /// Record a call; restarts the quiet period.
    pub fn call(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.interval));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Intervals for the editing session's recompute triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Minimum gap between style-driven recomputes, in milliseconds.
    pub throttle_ms: u64,
    /// Quiet period after the last resize before recomputing, in milliseconds.
    pub debounce_ms: u64,
}

impl ScheduleConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 250,
            debounce_ms: 250,
        }
    }
}
