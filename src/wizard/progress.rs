//! Busy indicator shown while a query is generated.
//!
//! The value creeps towards [`CAP`] on each tick and only reaches 100 when
//! the response arrives. It says nothing about real progress.

use std::time::Duration;

use rand::Rng;

/// How often a UI should call [`Progress::tick`].
pub const TICK_INTERVAL: Duration = Duration::from_millis(300);

/// Highest value reachable by ticking.
pub const CAP: f64 = 95.0;

/// Exclusive upper bound of a single random increment.
pub const MAX_STEP: f64 = 15.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    value: f64,
    active: bool,
}

impl Progress {
    pub fn start(&mut self) {
        self.value = 0.0;
        self.active = true;
    }

    /// Advance by a random step in `[0, MAX_STEP)`.
    pub fn tick(&mut self) -> f64 {
        let step = rand::rng().random_range(0.0..MAX_STEP);
        self.advance(step)
    }

    /// Advance by `step`, clamped to [`CAP`]. Ignored when idle.
    pub fn advance(&mut self, step: f64) -> f64 {
        if self.active {
            self.value = (self.value + step.max(0.0)).min(CAP);
        }
        self.value
    }

    pub fn complete(&mut self) {
        self.value = 100.0;
        self.active = false;
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
        self.active = false;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
