//! World state for scenario verification.
//!
//! The World holds everything a run leaves behind: the mode (with whatever
//! state it accumulated), the simulated bus with its logs, the environment
//! clock and how the delivery loop ended.

use std::time::Duration;

use marsmode_app::RunOutcome;
use marsmode_core::Environment;
use marsmode_proto::{Frame, SafetyMode};

use crate::{SimBus, SimEnv};

/// Final state of one scenario run.
pub struct World<M> {
    name: String,
    mode: M,
    bus: SimBus,
    env: SimEnv,
    outcome: RunOutcome,
}

impl<M> World<M> {
    pub(crate) fn new(name: String, mode: M, bus: SimBus, env: SimEnv, outcome: RunOutcome) -> Self {
        Self { name, mode, bus, env, outcome }
    }

    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mode after the run.
    pub fn mode(&self) -> &M {
        &self.mode
    }

    /// The simulated bus after the run.
    pub fn bus(&self) -> &SimBus {
        &self.bus
    }

    /// Virtual time when the run ended.
    pub fn elapsed(&self) -> Duration {
        self.env.now()
    }

    /// Every sleep the run requested.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.env.sleeps()
    }

    /// How the delivery loop ended.
    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// Frames with `payload` that reached the bus.
    pub fn transmitted_count(&self, payload: [u8; 8]) -> usize {
        count(self.bus.transmitted(), payload)
    }

    /// Frames with `payload` the interface accepted, including suppressed
    /// ones.
    pub fn accepted_count(&self, payload: [u8; 8]) -> usize {
        count(self.bus.accepted(), payload)
    }

    /// Frames that reached the bus at or after `t`.
    pub fn transmitted_since(&self, t: Duration) -> Vec<&Frame> {
        self.bus.transmitted().iter().filter(|(at, _)| *at >= t).map(|(_, f)| f).collect()
    }

    /// Safety mode the interface was left in.
    pub fn final_safety(&self) -> SafetyMode {
        self.bus.safety()
    }
}

fn count(log: &[(Duration, Frame)], payload: [u8; 8]) -> usize {
    log.iter().filter(|(_, f)| f.data == payload).count()
}
