//! Modes paced by random sleeps alone.
//!
//! The simplest strategy: press down, press up, sleep a random interval,
//! repeat. No synchronization with vehicle state.

use std::time::Duration;

use marsmode_proto::{
    Frame,
    payloads::{SPEED_DOWN, SPEED_UP, VOLUME_DOWN, VOLUME_UP},
};
use tracing::debug;

use crate::{
    action::ModeAction,
    mode::{Mode, ModeKind},
};

/// Blind timer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindTickleConfig {
    /// Registry name reported by the mode
    pub kind: ModeKind,
    /// First frame of the pair
    pub down: [u8; 8],
    /// Second frame of the pair
    pub up: [u8; 8],
    /// Gap inside the pair
    pub delay: Duration,
    /// Shortest wait between pairs
    pub interval_min: Duration,
    /// Longest wait between pairs
    pub interval_max: Duration,
}

impl BlindTickleConfig {
    /// Volume down/up pairs.
    pub fn media_volume(delay: Duration, interval_min: Duration, interval_max: Duration) -> Self {
        Self {
            kind: ModeKind::MediaVolumeBasic,
            down: VOLUME_DOWN,
            up: VOLUME_UP,
            delay,
            interval_min,
            interval_max,
        }
    }

    /// Set-speed down/up pairs.
    pub fn speed(delay: Duration, interval_min: Duration, interval_max: Duration) -> Self {
        Self { kind: ModeKind::SpeedBasic, down: SPEED_DOWN, up: SPEED_UP, delay, interval_min, interval_max }
    }
}

/// Blind timer mode. Stateless apart from its configuration.
#[derive(Debug, Clone)]
pub struct BlindTickle {
    config: BlindTickleConfig,
}

impl BlindTickle {
    /// Create the mode.
    pub fn new(config: BlindTickleConfig) -> Self {
        Self { config }
    }
}

impl Mode for BlindTickle {
    fn kind(&self) -> ModeKind {
        self.config.kind
    }

    fn handle_frame(&mut self, _frame: &Frame, _now: Duration) -> Vec<ModeAction> {
        Vec::new()
    }

    fn poll(&mut self, _now: Duration) -> Vec<ModeAction> {
        debug!(mode = %self.config.kind, "sending pair");
        vec![
            ModeAction::Send(Frame::steering(self.config.down)),
            ModeAction::Delay(self.config.delay),
            ModeAction::Send(Frame::steering(self.config.up)),
            ModeAction::RandomDelay { min: self.config.interval_min, max: self.config.interval_max },
        ]
    }
}
