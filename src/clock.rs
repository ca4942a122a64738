//! Wall clock and blocking sleeps.
//!
//! Every fixed-duration wait in the booth goes through [`Clock`], so a
//! whole session can run instantly against [`ManualClock`].

use chrono::{Local, NaiveDateTime};
use std::time::Duration;

/// Source of local time and blocking sleeps.
pub trait Clock {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Blocks the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Real time and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock that advances only when slept on.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: NaiveDateTime,
    slept: Duration,
    sleeps: u64,
}

impl ManualClock {
    /// Starts the clock at `start`.
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            now: start,
            slept: Duration::ZERO,
            sleeps: 0,
        }
    }

    /// Total virtual time slept.
    pub fn slept(&self) -> Duration {
        self.slept
    }

    /// Number of sleep calls.
    pub fn sleep_count(&self) -> u64 {
        self.sleeps
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.slept += duration;
        self.sleeps += 1;
        // chrono::Duration::from_std only fails past ~292 billion years
        if let Ok(step) = chrono::Duration::from_std(duration) {
            self.now += step;
        }
    }
}
