//! Virtual-clock environment.
//!
//! Sleeping advances the clock instantly, so a scenario covering minutes of
//! vehicle time runs in milliseconds. Randomness comes from a seeded
//! ChaCha8 RNG, making every jittered delay reproducible.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use marsmode_core::Environment;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Simulated environment. Clones share one clock and one RNG.
#[derive(Clone)]
pub struct SimEnv {
    inner: Rc<Inner>,
}

struct Inner {
    now: Cell<Duration>,
    rng: RefCell<ChaCha8Rng>,
    sleeps: RefCell<Vec<Duration>>,
}

impl SimEnv {
    /// Environment with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with a specific RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Rc::new(Inner {
                now: Cell::new(Duration::ZERO),
                rng: RefCell::new(ChaCha8Rng::seed_from_u64(seed)),
                sleeps: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Move the clock forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.inner.now.set(self.inner.now.get() + duration);
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.sleeps.borrow().clone()
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Duration {
        self.inner.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.inner.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }

    fn random_duration(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        self.inner.rng.borrow_mut().gen_range(min..max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_advances_shared_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.sleep(Duration::from_millis(300));
        other.sleep(Duration::from_millis(200));

        assert_eq!(env.now(), Duration::from_millis(500));
        assert_eq!(env.sleeps(), vec![Duration::from_millis(300), Duration::from_millis(200)]);
    }

    #[test]
    fn advance_is_not_a_sleep() {
        let env = SimEnv::new();
        env.advance(Duration::from_secs(1));
        assert_eq!(env.now(), Duration::from_secs(1));
        assert!(env.sleeps().is_empty());
    }

    #[test]
    fn same_seed_same_jitter() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        let max = Duration::from_secs(2);

        for _ in 0..16 {
            let x = a.random_duration(Duration::ZERO, max);
            assert_eq!(x, b.random_duration(Duration::ZERO, max));
            assert!(x < max);
        }
    }

    #[test]
    fn empty_range_returns_min() {
        let env = SimEnv::new();
        let d = Duration::from_secs(3);
        assert_eq!(env.random_duration(d, d), d);
    }
}
