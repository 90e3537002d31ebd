//! Delivery loop around the bus interface.
//!
//! [`Controller`] owns the connection lifecycle: initial connect with bus
//! speed and safety configuration, a per-iteration exception budget,
//! disconnect-wait-reconnect when the budget is exhausted, and cleanup on
//! every exit path (normal return, shutdown request, panic unwinding).
//!
//! In dry-run mode the controller never touches the interface: outgoing
//! operations are logged and receive returns nothing.

use std::{ops::ControlFlow, time::Duration};

use marsmode_core::{Environment, ModeAction};
use marsmode_proto::{BUS_MAIN, BUS_VEHICLE, Frame, SafetyMode};
use tracing::{debug, error, info, warn};

use crate::{BusInterface, ControllerError, ShutdownFlag};

/// Consecutive failed iterations tolerated before reconnecting.
pub const MAX_EXCEPTION_COUNT: u32 = 5;

/// Pause between disconnect and reconnect, and after a failed iteration.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1200);

/// Connection parameters applied on every (re)connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Bit rate applied to both buses
    pub can_speed_kbps: u32,
    /// Transmit policy applied after connecting
    pub safety_mode: SafetyMode,
    /// Log instead of touching the interface
    pub dry_run: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            can_speed_kbps: marsmode_proto::ids::DEFAULT_CAN_SPEED_KBPS,
            safety_mode: SafetyMode::AllowOutput,
            dry_run: false,
        }
    }
}

/// Why [`Controller::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The step function asked to stop.
    Stopped,
    /// The shutdown flag was set.
    ShutdownRequested,
    /// The initial connection failed; the step function never ran.
    ConnectFailed,
    /// The exception budget ran out and reconnecting failed.
    ReconnectFailed,
}

/// Connection lifecycle and delivery loop.
pub struct Controller<B, E> {
    bus: B,
    env: E,
    config: ControllerConfig,
    connected: bool,
    exception_count: u32,
    generation: u64,
    shutdown: ShutdownFlag,
}

impl<B: BusInterface, E: Environment> Controller<B, E> {
    /// Create a disconnected controller with its own shutdown flag.
    pub fn new(bus: B, env: E, config: ControllerConfig) -> Self {
        Self::with_shutdown(bus, env, config, ShutdownFlag::new())
    }

    /// Create a disconnected controller observing an existing shutdown flag.
    pub fn with_shutdown(bus: B, env: E, config: ControllerConfig, shutdown: ShutdownFlag) -> Self {
        Self { bus, env, config, connected: false, exception_count: 0, generation: 0, shutdown }
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Consecutive failed iterations since the last success or reconnect.
    pub fn exception_count(&self) -> u32 {
        self.exception_count
    }

    /// Number of successful connects so far.
    ///
    /// Changes exactly when a new session starts, which is when the mode's
    /// connect hook has to run again.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Connection parameters.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Environment used for time and sleeping.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Underlying bus interface.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give back the bus interface and the environment.
    pub fn into_parts(self) -> (B, E) {
        (self.bus, self.env)
    }

    /// Handle to the shutdown flag this controller observes.
    pub fn shutdown_handle(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Ask the delivery loop to stop before its next iteration.
    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    /// Open the interface, set both bus speeds and apply the safety mode.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Bus`] if any of the setup calls fail; the
    /// controller is left disconnected.
    pub fn connect(&mut self) -> Result<(), ControllerError> {
        if self.config.dry_run {
            info!("[dry run] would connect to bus interface");
            self.on_connected();
            return Ok(());
        }

        debug!(kbps = self.config.can_speed_kbps, "connecting to bus interface");
        match open(&mut self.bus, &self.config) {
            Ok(()) => {
                info!(safety = %self.config.safety_mode, "connected to bus interface");
                self.on_connected();
                Ok(())
            },
            Err(e) => {
                error!(error = %e, "failed to connect to bus interface");
                self.connected = false;
                Err(ControllerError::bus(e))
            },
        }
    }

    fn on_connected(&mut self) {
        self.connected = true;
        self.exception_count = 0;
        self.generation += 1;
    }

    /// Silence output and release the interface.
    ///
    /// Errors are logged and swallowed; disconnecting always succeeds from
    /// the caller's point of view.
    pub fn disconnect(&mut self) {
        self.connected = false;

        if self.config.dry_run {
            debug!("[dry run] would disconnect from bus interface");
            return;
        }

        if let Err(e) = self.bus.set_safety_mode(SafetyMode::Silent) {
            debug!(error = %e, "error silencing output during disconnect");
        }
        self.bus.disconnect();
        debug!("disconnected from bus interface");
    }

    /// Disconnect, wait [`RECONNECT_DELAY`], connect again.
    ///
    /// # Errors
    ///
    /// Returns the error of the new connect attempt.
    pub fn reconnect(&mut self) -> Result<(), ControllerError> {
        info!("reconnecting to bus interface");
        self.disconnect();
        self.env.sleep(RECONNECT_DELAY);
        self.connect()
    }

    /// Transmit one frame.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::NotConnected`] without a live connection
    /// - [`ControllerError::Bus`] if the driver rejects the frame
    pub fn send(&mut self, frame: &Frame) -> Result<(), ControllerError> {
        if self.config.dry_run {
            debug!(%frame, "[dry run] would send frame");
            return Ok(());
        }
        if !self.connected {
            error!(%frame, "cannot send, not connected");
            return Err(ControllerError::NotConnected);
        }

        self.bus.send(frame).map_err(|e| {
            error!(%frame, error = %e, "failed to send frame");
            ControllerError::bus(e)
        })
    }

    /// Drain received frames. Dry-run always yields an empty batch.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::NotConnected`] without a live connection
    /// - [`ControllerError::Bus`] if the driver fails
    pub fn receive(&mut self) -> Result<Vec<Frame>, ControllerError> {
        if self.config.dry_run {
            return Ok(Vec::new());
        }
        if !self.connected {
            return Err(ControllerError::NotConnected);
        }

        self.bus.receive().map_err(|e| {
            error!(error = %e, "failed to receive frames");
            ControllerError::bus(e)
        })
    }

    /// Switch the transmit policy.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::NotConnected`] without a live connection
    /// - [`ControllerError::Bus`] if the driver fails
    pub fn set_safety_mode(&mut self, mode: SafetyMode) -> Result<(), ControllerError> {
        if self.config.dry_run {
            debug!(%mode, "[dry run] would set safety mode");
            return Ok(());
        }
        if !self.connected {
            return Err(ControllerError::NotConnected);
        }

        self.bus.set_safety_mode(mode).map_err(|e| {
            error!(%mode, error = %e, "failed to set safety mode");
            ControllerError::bus(e)
        })?;
        debug!(%mode, "safety mode set");
        Ok(())
    }

    /// Execute mode actions in order.
    ///
    /// Every action runs even if an earlier one failed, so delays keep
    /// their timing and a trailing safety change is never skipped. The
    /// first error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first send or safety-mode error.
    pub fn execute(&mut self, actions: impl IntoIterator<Item = ModeAction>) -> Result<(), ControllerError> {
        let mut first_error = None;

        for action in actions {
            let result = match action {
                ModeAction::Send(frame) => self.send(&frame),
                ModeAction::SetSafety(mode) => self.set_safety_mode(mode),
                ModeAction::Delay(duration) => {
                    self.env.sleep(duration);
                    Ok(())
                },
                ModeAction::RandomDelay { min, max } => {
                    let duration = self.env.random_duration(min, max);
                    debug!(secs = duration.as_secs_f64(), "waiting");
                    self.env.sleep(duration);
                    Ok(())
                },
            };

            if let Err(e) = result
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Run the delivery loop.
    ///
    /// Connects, then calls `step` until it breaks or shutdown is requested.
    /// A successful iteration resets the exception count. A failed one
    /// increments it; once it exceeds [`MAX_EXCEPTION_COUNT`] with
    /// `retry_on_error` set, the controller reconnects, otherwise it waits
    /// [`RECONNECT_DELAY`] before the next iteration.
    ///
    /// The interface is disconnected (and output silenced) on every exit
    /// path, including a panic inside `step`.
    pub fn run<F>(&mut self, step: F, retry_on_error: bool) -> RunOutcome
    where
        F: FnMut(&mut Self) -> Result<ControlFlow<()>, ControllerError>,
    {
        if self.connect().is_err() {
            error!("initial connection failed");
            return RunOutcome::ConnectFailed;
        }

        let session = Session { controller: self };
        session.controller.deliver(step, retry_on_error)
    }

    fn deliver<F>(&mut self, mut step: F, retry_on_error: bool) -> RunOutcome
    where
        F: FnMut(&mut Self) -> Result<ControlFlow<()>, ControllerError>,
    {
        loop {
            if self.shutdown.is_requested() {
                info!("shutdown requested");
                return RunOutcome::ShutdownRequested;
            }

            match step(self) {
                Ok(flow) => {
                    self.exception_count = 0;
                    if flow.is_break() {
                        return RunOutcome::Stopped;
                    }
                },
                Err(e) => {
                    self.exception_count += 1;
                    error!(count = self.exception_count, error = %e, "error in delivery loop");

                    if retry_on_error && self.exception_count > MAX_EXCEPTION_COUNT {
                        warn!("too many consecutive errors, reconnecting");
                        if self.reconnect().is_err() {
                            error!("reconnection failed, giving up");
                            return RunOutcome::ReconnectFailed;
                        }
                    } else {
                        self.env.sleep(RECONNECT_DELAY);
                    }
                },
            }
        }
    }
}

/// Connect and configure. A device that opened but failed configuration is
/// released again.
fn open<B: BusInterface>(bus: &mut B, config: &ControllerConfig) -> Result<(), B::Error> {
    bus.connect()?;
    configure(bus, config).inspect_err(|_| bus.disconnect())
}

fn configure<B: BusInterface>(bus: &mut B, config: &ControllerConfig) -> Result<(), B::Error> {
    bus.set_bus_speed(BUS_MAIN, config.can_speed_kbps)?;
    bus.set_bus_speed(BUS_VEHICLE, config.can_speed_kbps)?;
    bus.set_safety_mode(config.safety_mode)
}

/// Disconnects on drop, covering early returns and unwinding.
struct Session<'a, B: BusInterface, E: Environment> {
    controller: &'a mut Controller<B, E>,
}

impl<B: BusInterface, E: Environment> Drop for Session<'_, B, E> {
    fn drop(&mut self) {
        debug!("cleaning up delivery loop");
        self.controller.disconnect();
    }
}
