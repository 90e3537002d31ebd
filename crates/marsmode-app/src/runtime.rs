//! Drives a mode through the delivery loop.
//!
//! Each iteration of the loop:
//!
//! 1. Runs the mode's connect hook if a new session started since the last
//!    iteration (first connect or reconnect).
//! 2. Drains received frames and hands each one to the mode.
//! 3. Polls the mode once for timer-driven actions.
//! 4. Sleeps the poll interval.
//!
//! Actions are executed by the [`Controller`] as they come back. A failed
//! action does not stop the batch; the first error is reported so it counts
//! against the exception budget.

use std::{ops::ControlFlow, time::Duration};

use marsmode_core::{Environment, Mode};
use tracing::{info, trace};

use crate::{BusInterface, Controller, ControllerError, RunOutcome};

/// One mode bound to one controller.
pub struct Runtime<M, B, E> {
    controller: Controller<B, E>,
    mode: M,
    poll_interval: Duration,
    synced_generation: u64,
}

impl<M: Mode, B: BusInterface, E: Environment> Runtime<M, B, E> {
    /// Bind `mode` to `controller`.
    pub fn new(controller: Controller<B, E>, mode: M, poll_interval: Duration) -> Self {
        Self { controller, mode, poll_interval, synced_generation: 0 }
    }

    /// Run until shutdown or an unrecoverable connection failure.
    pub fn run(&mut self, retry_on_error: bool) -> RunOutcome {
        info!(mode = %self.mode.kind(), dry_run = self.controller.config().dry_run, "starting");

        let mode = &mut self.mode;
        let synced = &mut self.synced_generation;
        let poll_interval = self.poll_interval;

        let outcome = self
            .controller
            .run(|controller| iterate(controller, mode, synced, poll_interval), retry_on_error);

        info!(?outcome, "stopped");
        outcome
    }

    /// The mode being driven.
    pub fn mode(&self) -> &M {
        &self.mode
    }

    /// The underlying controller.
    pub fn controller(&self) -> &Controller<B, E> {
        &self.controller
    }

    /// Take the parts back, e.g. to inspect a simulated bus after a run.
    pub fn into_parts(self) -> (Controller<B, E>, M) {
        (self.controller, self.mode)
    }
}

fn iterate<M, B, E>(
    controller: &mut Controller<B, E>,
    mode: &mut M,
    synced_generation: &mut u64,
    poll_interval: Duration,
) -> Result<ControlFlow<()>, ControllerError>
where
    M: Mode,
    B: BusInterface,
    E: Environment,
{
    if controller.generation() != *synced_generation {
        controller.execute(mode.on_connect())?;
        *synced_generation = controller.generation();
    }

    let frames = controller.receive()?;
    let mut first_error = None;

    for frame in &frames {
        trace!(%frame, "received");
        let now = controller.env().now();
        let actions = mode.handle_frame(frame, now);
        if let Err(e) = controller.execute(actions) {
            first_error.get_or_insert(e);
        }
    }

    let now = controller.env().now();
    if let Err(e) = controller.execute(mode.poll(now)) {
        first_error.get_or_insert(e);
    }

    if !poll_interval.is_zero() {
        controller.env().sleep(poll_interval);
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(ControlFlow::Continue(())),
    }
}
