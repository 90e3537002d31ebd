//! Environment abstraction.
//!
//! The runtime never calls `Instant::now`, `thread::sleep` or a global RNG
//! directly. It goes through [`Environment`] so simulation can substitute a
//! virtual clock and a seeded RNG and replay every timing decision exactly.

use std::time::{Duration, Instant};

use rand::Rng;

/// Time, blocking waits and randomness.
pub trait Environment {
    /// Monotonic time since the environment was created.
    fn now(&self) -> Duration;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);

    /// Uniformly random duration in `[min, max)`. Returns `min` when the
    /// range is empty.
    fn random_duration(&self, min: Duration, max: Duration) -> Duration;
}

/// Production environment: real monotonic clock, real sleeps, thread RNG.
#[derive(Debug, Clone)]
pub struct SystemEnv {
    start: Instant,
}

impl SystemEnv {
    /// Start the clock now.
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn random_duration(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..max)
    }
}
