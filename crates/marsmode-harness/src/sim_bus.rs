//! Scripted bus interface.
//!
//! [`SimBus`] replays a timeline of received frames against the shared
//! [`SimEnv`] clock: a frame scheduled at `t` is returned by the first
//! `receive` at or after `t`. Outgoing frames are logged twice, once as
//! accepted by the interface and once more only if the safety mode let them
//! reach the bus. Faults are injected by count.

use std::{collections::VecDeque, time::Duration};

use marsmode_app::{BusInterface, ShutdownFlag};
use marsmode_core::Environment;
use marsmode_proto::{Frame, SafetyMode};
use thiserror::Error;
use tracing::trace;

use crate::SimEnv;

/// Injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimBusError {
    /// Connect attempt refused.
    #[error("simulated connect failure")]
    ConnectRefused,
    /// Send rejected.
    #[error("simulated send failure")]
    SendFailed,
    /// Receive failed.
    #[error("simulated receive failure")]
    ReceiveFailed,
    /// Bus speed rejected.
    #[error("simulated bus speed failure")]
    BusSpeedRejected,
    /// Call made while the device is closed.
    #[error("simulated device is not open")]
    NotOpen,
}

/// Simulated bus interface.
pub struct SimBus {
    env: SimEnv,
    script: VecDeque<(Duration, Frame)>,
    open: bool,
    safety: SafetyMode,
    safety_history: Vec<SafetyMode>,
    bus_speeds: Vec<(u8, u32)>,
    accepted: Vec<(Duration, Frame)>,
    transmitted: Vec<(Duration, Frame)>,
    connect_attempts: u32,
    connects: u32,
    disconnects: u32,
    receives: u32,
    max_connects: Option<u32>,
    failing_connects: u32,
    failing_sends: u32,
    failing_receives: u32,
    failing_bus_speeds: u32,
    shutdown: Option<(Duration, ShutdownFlag)>,
}

impl SimBus {
    /// Closed, silent interface with an empty script.
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            script: VecDeque::new(),
            open: false,
            safety: SafetyMode::Silent,
            safety_history: Vec::new(),
            bus_speeds: Vec::new(),
            accepted: Vec::new(),
            transmitted: Vec::new(),
            connect_attempts: 0,
            connects: 0,
            disconnects: 0,
            receives: 0,
            max_connects: None,
            failing_connects: 0,
            failing_sends: 0,
            failing_receives: 0,
            failing_bus_speeds: 0,
            shutdown: None,
        }
    }

    /// Schedule a received frame at virtual time `at`.
    ///
    /// Frames with equal times are delivered in insertion order.
    pub fn schedule(&mut self, at: Duration, frame: Frame) {
        let index = self.script.partition_point(|(t, _)| *t <= at);
        self.script.insert(index, (at, frame));
    }

    /// Builder form of [`SimBus::schedule`].
    pub fn with_frame(mut self, at: Duration, frame: Frame) -> Self {
        self.schedule(at, frame);
        self
    }

    /// Refuse the next `count` connect attempts.
    pub fn fail_connects(&mut self, count: u32) {
        self.failing_connects = count;
    }

    /// Refuse every connect attempt after `count` successful ones.
    pub fn limit_connects(&mut self, count: u32) {
        self.max_connects = Some(count);
    }

    /// Reject the next `count` sends.
    pub fn fail_sends(&mut self, count: u32) {
        self.failing_sends = count;
    }

    /// Fail the next `count` receives.
    pub fn fail_receives(&mut self, count: u32) {
        self.failing_receives = count;
    }

    /// Reject the next `count` bus speed changes.
    pub fn fail_bus_speeds(&mut self, count: u32) {
        self.failing_bus_speeds = count;
    }

    /// Set `flag` from the first receive at or after `deadline`.
    pub fn shutdown_at(&mut self, deadline: Duration, flag: ShutdownFlag) {
        self.shutdown = Some((deadline, flag));
    }

    /// Whether the device is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current transmit policy.
    pub fn safety(&self) -> SafetyMode {
        self.safety
    }

    /// Every safety mode applied while open, in order.
    pub fn safety_history(&self) -> &[SafetyMode] {
        &self.safety_history
    }

    /// Every `(bus, kbps)` configured.
    pub fn bus_speeds(&self) -> &[(u8, u32)] {
        &self.bus_speeds
    }

    /// Frames the interface accepted, whatever the safety mode.
    pub fn accepted(&self) -> &[(Duration, Frame)] {
        &self.accepted
    }

    /// Frames that actually reached the bus.
    pub fn transmitted(&self) -> &[(Duration, Frame)] {
        &self.transmitted
    }

    /// Payloads that reached the bus, without timestamps.
    pub fn transmitted_payloads(&self) -> Vec<Vec<u8>> {
        self.transmitted.iter().map(|(_, f)| f.data.clone()).collect()
    }

    /// Connect calls made, successful or not.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    /// Successful connects.
    pub fn connects(&self) -> u32 {
        self.connects
    }

    /// Disconnect calls made.
    pub fn disconnects(&self) -> u32 {
        self.disconnects
    }

    /// Receive calls made, successful or not.
    pub fn receives(&self) -> u32 {
        self.receives
    }

    /// Scheduled frames not yet delivered.
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    fn ensure_open(&self) -> Result<(), SimBusError> {
        if self.open { Ok(()) } else { Err(SimBusError::NotOpen) }
    }
}

impl BusInterface for SimBus {
    type Error = SimBusError;

    fn connect(&mut self) -> Result<(), Self::Error> {
        self.connect_attempts += 1;

        let over_limit = self.max_connects.is_some_and(|max| self.connects >= max);
        if over_limit || self.failing_connects > 0 {
            self.failing_connects = self.failing_connects.saturating_sub(1);
            return Err(SimBusError::ConnectRefused);
        }

        self.open = true;
        self.connects += 1;
        Ok(())
    }

    fn set_bus_speed(&mut self, bus: u8, kbps: u32) -> Result<(), Self::Error> {
        self.ensure_open()?;
        if self.failing_bus_speeds > 0 {
            self.failing_bus_speeds -= 1;
            return Err(SimBusError::BusSpeedRejected);
        }
        self.bus_speeds.push((bus, kbps));
        Ok(())
    }

    fn set_safety_mode(&mut self, mode: SafetyMode) -> Result<(), Self::Error> {
        self.ensure_open()?;
        self.safety = mode;
        self.safety_history.push(mode);
        Ok(())
    }

    fn send(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        self.ensure_open()?;
        if self.failing_sends > 0 {
            self.failing_sends -= 1;
            return Err(SimBusError::SendFailed);
        }

        let now = self.env.now();
        self.accepted.push((now, frame.clone()));
        if self.safety == SafetyMode::AllowOutput {
            trace!(%frame, "transmitted");
            self.transmitted.push((now, frame.clone()));
        } else {
            trace!(%frame, "suppressed by silent mode");
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<Frame>, Self::Error> {
        self.receives += 1;
        self.ensure_open()?;

        let now = self.env.now();
        if let Some((deadline, flag)) = &self.shutdown
            && now >= *deadline
        {
            flag.request();
        }

        if self.failing_receives > 0 {
            self.failing_receives -= 1;
            return Err(SimBusError::ReceiveFailed);
        }

        let mut batch = Vec::new();
        while self.script.front().is_some_and(|(at, _)| *at <= now) {
            if let Some((_, frame)) = self.script.pop_front() {
                batch.push(frame);
            }
        }
        Ok(batch)
    }

    fn disconnect(&mut self) {
        self.open = false;
        self.disconnects += 1;
    }
}
