//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use std::time::Duration;

use marsmode_app::{Controller, ControllerConfig, Runtime, ShutdownFlag};
use marsmode_core::Mode;
use marsmode_proto::{BUS_MAIN, CLOCK_ID, Frame, GEAR_ID};

use crate::{
    SimBus, SimEnv,
    scenario::{OracleFn, World},
};

/// Clock value carried by the first synthetic tick.
const CLOCK_EPOCH: u32 = 1_700_000_000;

type BusSetup = Box<dyn FnOnce(&mut SimBus)>;

/// Scenario builder.
///
/// Construct a scenario by choosing a mode and scheduling frames. Must call
/// `.oracle()` to get a [`RunnableScenario`] that can be executed.
pub struct Scenario<M> {
    name: String,
    mode: M,
    seed: u64,
    controller: ControllerConfig,
    poll_interval: Duration,
    duration: Duration,
    retry_on_error: bool,
    frames: Vec<(Duration, Frame)>,
    setup: Option<BusSetup>,
}

impl<M: Mode> Scenario<M> {
    /// Create a new scenario driving `mode`.
    ///
    /// Defaults: seed 0, default controller settings, 1 ms poll interval,
    /// ten seconds of virtual time, reconnect on repeated errors.
    pub fn new(name: impl Into<String>, mode: M) -> Self {
        Self {
            name: name.into(),
            mode,
            seed: 0,
            controller: ControllerConfig::default(),
            poll_interval: Duration::from_millis(1),
            duration: Duration::from_secs(10),
            retry_on_error: true,
            frames: Vec::new(),
            setup: None,
        }
    }

    /// Seed for the environment RNG.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Connection parameters.
    pub fn controller_config(mut self, config: ControllerConfig) -> Self {
        self.controller = config;
        self
    }

    /// Sleep between loop iterations.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Virtual time after which shutdown is requested.
    pub fn run_for(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether the delivery loop reconnects after too many errors.
    pub fn retry_on_error(mut self, retry: bool) -> Self {
        self.retry_on_error = retry;
        self
    }

    /// Schedule an arbitrary received frame.
    pub fn frame_at(mut self, at: Duration, frame: Frame) -> Self {
        self.frames.push((at, frame));
        self
    }

    /// Schedule `count` main-bus clock ticks, one every `period`, starting at
    /// `first`. Tick values count up one second at a time.
    pub fn clock_ticks(mut self, first: Duration, period: Duration, count: u32) -> Self {
        for i in 0..count {
            let payload = (CLOCK_EPOCH + i).to_be_bytes().to_vec();
            let frame = Frame { id: CLOCK_ID, data: payload, bus: BUS_MAIN };
            self.frames.push((first + period * i, frame));
        }
        self
    }

    /// Schedule a steering control frame on the main bus.
    pub fn steering_at(self, at: Duration, payload: [u8; 8]) -> Self {
        self.frame_at(at, Frame::steering(payload))
    }

    /// Schedule a gear frame whose gear byte is `gear`.
    pub fn gear_at(self, at: Duration, gear: u8) -> Self {
        self.frame_at(at, Frame { id: GEAR_ID, data: vec![0, 0, gear, 0], bus: BUS_MAIN })
    }

    /// Adjust the simulated bus before the run, e.g. to inject faults.
    pub fn setup_bus(mut self, setup: impl FnOnce(&mut SimBus) + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn<M>) -> RunnableScenario<M> {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario<M> {
    scenario: Scenario<M>,
    oracle: OracleFn<M>,
}

impl<M: Mode> RunnableScenario<M> {
    /// Execute the scenario.
    ///
    /// Schedules every frame on a fresh [`SimBus`], runs the mode through
    /// the delivery loop until the deadline passes (or the loop gives up),
    /// then runs the oracle on the final world.
    ///
    /// # Errors
    ///
    /// Returns the oracle's error prefixed with the scenario name. Dry-run
    /// scenarios are rejected: a dry-run loop never polls the bus, so the
    /// deadline would never be observed.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, mode, seed, controller, poll_interval, duration, retry_on_error, frames, setup } =
            self.scenario;

        if controller.dry_run {
            return Err(format!("Scenario '{name}': dry-run never observes the shutdown deadline"));
        }

        let env = SimEnv::with_seed(seed);
        let mut bus = SimBus::new(env.clone());
        for (at, frame) in frames {
            bus.schedule(at, frame);
        }
        if let Some(setup) = setup {
            setup(&mut bus);
        }

        let shutdown = ShutdownFlag::new();
        bus.shutdown_at(duration, shutdown.clone());

        let controller = Controller::with_shutdown(bus, env, controller, shutdown);
        let mut runtime = Runtime::new(controller, mode, poll_interval);
        let outcome = runtime.run(retry_on_error);

        let (controller, mode) = runtime.into_parts();
        let (bus, env) = controller.into_parts();
        let world = World::new(name, mode, bus, env, outcome);

        (self.oracle)(&world).map_err(|e| format!("Scenario '{}': {e}", world.name()))
    }
}
