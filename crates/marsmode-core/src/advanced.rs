//! Advanced mode: gesture controls and park detection.
//!
//! This module implements the richest keep-awake strategy. It listens to the
//! clock broadcast for cadence, to the steering controls for operator
//! gestures and to the gear selector for motion state.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept time as parameter (no stored clock)
//! - Methods return `Vec<ModeAction>`
//! - The runtime executes actions (send frames, switch safety mode, wait)
//!
//! # Gestures
//!
//! ```text
//!  play/pause ×2 within window        left tilt ×2 within window
//!  ┌─────────┐ ──────────────> ┌──────────┐     Volume ──> Speed
//!  │ Enabled │                 │ Disabled │       ^          │
//!  └─────────┘ <────────────── └──────────┘       └─ MediaBack <┘
//! ```
//!
//! # Safety mode
//!
//! The interface is in allow-output exactly when the mode is enabled and the
//! vehicle is not parked. Confirmation signals that must be visible while
//! disabled force allow-output for their duration and restore silent after.
//!
//! # Timing
//!
//! - **Startup**: first clock tick triggers a one-time ready signal
//! - **Tickle**: every `tickle_interval` clock ticks, after a random jitter
//! - **Double tap**: second press strictly inside the configured window

use std::{fmt, time::Duration};

use marsmode_proto::{
    BUS_MAIN, CLOCK_ID, Frame, GEAR_ID, GearEvidence, STEERING_ID, SafetyMode, SteeringInput,
    parse_clock,
    payloads::{MEDIA_BACK, SPEED_DOWN, SPEED_UP, VOLUME_DOWN, VOLUME_UP},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    action::ModeAction,
    mode::{Mode, ModeKind},
};

/// Upper bound of the random wait before every tickle.
pub const TICKLE_JITTER_MAX: Duration = Duration::from_secs(2);

/// Added to `volume_delay` so confirmation pairs read differently from
/// tickles.
pub const CONFIRM_EXTRA_DELAY: Duration = Duration::from_millis(200);

/// Advanced mode configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedConfig {
    /// Number of frames in the startup signal (sent as `count / 2` pairs)
    pub startup_signal_count: u32,
    /// Wait after every startup frame
    pub startup_signal_delay: Duration,
    /// Clock ticks between tickles
    pub tickle_interval: u32,
    /// Lower bound of the double-tap window (exclusive)
    pub double_tap_min: Duration,
    /// Upper bound of the double-tap window (exclusive)
    pub double_tap_max: Duration,
    /// Gap inside a volume pair
    pub volume_delay: Duration,
    /// Gap inside a speed pair
    pub speed_delay: Duration,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            startup_signal_count: 4,
            startup_signal_delay: Duration::from_millis(500),
            tickle_interval: 5,
            double_tap_min: Duration::from_millis(200),
            double_tap_max: Duration::from_millis(750),
            volume_delay: Duration::from_millis(300),
            speed_delay: Duration::from_millis(300),
        }
    }
}

impl AdvancedConfig {
    /// Gap inside gesture confirmation pairs.
    pub fn confirm_delay(&self) -> Duration {
        self.volume_delay + CONFIRM_EXTRA_DELAY
    }
}

/// Synthetic action cycled by the left-tilt gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubMode {
    /// Volume down/up
    #[default]
    Volume,
    /// Set-speed down/up
    Speed,
    /// Media back
    MediaBack,
}

impl SubMode {
    /// Next sub-mode in the forward-only cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Volume => Self::Speed,
            Self::Speed => Self::MediaBack,
            Self::MediaBack => Self::Volume,
        }
    }
}

impl fmt::Display for SubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Volume => "volume",
            Self::Speed => "speed",
            Self::MediaBack => "media_back",
        })
    }
}

/// Working memory of the advanced mode.
///
/// Timestamps are `None` until the corresponding event has been seen, which
/// orders before every real timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    /// Synthetic frames are being injected
    pub enabled: bool,
    /// Tickle flavor
    pub sub_mode: SubMode,
    /// One-time startup signal has run
    pub boot_initialized: bool,
    /// Vehicle is in park
    pub parked: bool,
    /// Clock ticks since the last tickle or gesture
    pub tick_counter: u32,
    /// Latest park evidence
    pub last_park: Option<Duration>,
    /// Latest drive evidence
    pub last_drive: Option<Duration>,
    /// Latest play/pause press (after its handling settled)
    pub last_play_pause: Option<Duration>,
    /// Latest left tilt (after its handling settled)
    pub last_left_tilt: Option<Duration>,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            enabled: true,
            sub_mode: SubMode::Volume,
            boot_initialized: false,
            parked: false,
            tick_counter: 0,
            last_park: None,
            last_drive: None,
            last_play_pause: None,
            last_left_tilt: None,
        }
    }
}

impl ModeState {
    /// Safety mode the interface should sit in between signals.
    pub fn resting_safety(&self) -> SafetyMode {
        if self.enabled && !self.parked { SafetyMode::AllowOutput } else { SafetyMode::Silent }
    }
}

/// Advanced mode state machine
///
/// This is a pure state machine - no I/O, no stored clock.
#[derive(Debug, Clone)]
pub struct AdvancedMode {
    config: AdvancedConfig,
    state: ModeState,
}

impl AdvancedMode {
    /// Create the mode with fresh state (enabled, volume, not parked).
    pub fn new(config: AdvancedConfig) -> Self {
        Self::with_state(config, ModeState::default())
    }

    /// Resume from a state snapshot.
    pub fn with_state(config: AdvancedConfig, state: ModeState) -> Self {
        Self { config, state }
    }

    /// Current working memory.
    pub fn state(&self) -> &ModeState {
        &self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &AdvancedConfig {
        &self.config
    }

    /// Handle a clock broadcast.
    ///
    /// Drives the one-time startup signal and the tickle cadence. The payload
    /// is decoded for logging only; a malformed clock never stops counting.
    pub fn handle_clock_tick(&mut self, data: &[u8]) -> Vec<ModeAction> {
        match parse_clock(data) {
            Ok(secs) => debug!(secs, "car clock"),
            Err(e) => debug!(error = %e, "ignoring malformed clock payload"),
        }

        let mut actions = Vec::new();

        if !self.state.boot_initialized {
            actions.extend(self.startup_sequence());
        }

        if self.state.enabled {
            self.state.tick_counter += 1;
            if self.state.tick_counter >= self.config.tickle_interval {
                self.state.tick_counter = 0;
                actions.extend(self.tickle());
            }
        }

        actions
    }

    /// Handle a steering control frame.
    ///
    /// Only play/pause and left tilt are gestures; everything else, including
    /// payloads shorter than two bytes, is ignored.
    pub fn handle_steering(&mut self, data: &[u8], now: Duration) -> Vec<ModeAction> {
        match SteeringInput::classify(data) {
            Some(SteeringInput::PlayPause) => self.handle_play_pause(now),
            Some(SteeringInput::LeftTilt) => self.handle_left_tilt(now),
            None => Vec::new(),
        }
    }

    /// Handle a gear selector frame.
    pub fn handle_gear(&mut self, data: &[u8], now: Duration) -> Vec<ModeAction> {
        let Some(evidence) = GearEvidence::classify(data) else {
            debug!(len = data.len(), "ignoring short gear payload");
            return Vec::new();
        };

        match evidence {
            GearEvidence::Park => self.state.last_park = Some(now),
            GearEvidence::Drive => self.state.last_drive = Some(now),
        }

        if !self.state.parked && self.state.last_park > self.state.last_drive {
            self.state.parked = true;
            info!("changing to PARK mode");
            if self.state.enabled {
                return vec![ModeAction::SetSafety(SafetyMode::Silent)];
            }
        } else if self.state.parked && self.state.last_drive > self.state.last_park {
            self.state.parked = false;
            info!(gear = data[2], "changing to NON-PARK mode");
            if self.state.enabled {
                return vec![ModeAction::SetSafety(SafetyMode::AllowOutput)];
            }
        }

        Vec::new()
    }

    fn startup_sequence(&mut self) -> Vec<ModeAction> {
        self.state.boot_initialized = true;
        info!("boot sequence: startup detected");

        let delay = self.config.startup_signal_delay;
        let mut actions = vec![ModeAction::SetSafety(SafetyMode::AllowOutput)];
        for _ in 0..self.config.startup_signal_count / 2 {
            actions.extend([
                ModeAction::Send(Frame::steering(VOLUME_DOWN)),
                ModeAction::Delay(delay),
                ModeAction::Send(Frame::steering(VOLUME_UP)),
                ModeAction::Delay(delay),
            ]);
        }

        let resting = self.state.resting_safety();
        if resting != SafetyMode::AllowOutput {
            actions.push(ModeAction::SetSafety(resting));
        }
        actions
    }

    fn tickle(&self) -> Vec<ModeAction> {
        let mut actions =
            vec![ModeAction::RandomDelay { min: Duration::ZERO, max: TICKLE_JITTER_MAX }];

        match self.state.sub_mode {
            SubMode::Volume => {
                debug!("media volume signals sent");
                actions.extend([
                    ModeAction::Send(Frame::steering(VOLUME_DOWN)),
                    ModeAction::Delay(self.config.volume_delay),
                    ModeAction::Send(Frame::steering(VOLUME_UP)),
                ]);
            },
            SubMode::Speed => {
                debug!("speed signals sent");
                actions.extend([
                    ModeAction::Send(Frame::steering(SPEED_DOWN)),
                    ModeAction::Delay(self.config.speed_delay),
                    ModeAction::Send(Frame::steering(SPEED_UP)),
                ]);
            },
            SubMode::MediaBack => {
                debug!("media back signal sent");
                actions.push(ModeAction::Send(Frame::steering(MEDIA_BACK)));
            },
        }

        actions
    }

    fn handle_play_pause(&mut self, now: Duration) -> Vec<ModeAction> {
        debug!("play/pause detected");
        self.state.tick_counter = 0;

        let elapsed = elapsed_since(self.state.last_play_pause, now);
        let actions = if self.is_double_tap(elapsed) {
            info!(elapsed_ms = millis(elapsed), "double tap detected");
            self.toggle()
        } else {
            debug!(elapsed_ms = millis(elapsed), "single click");
            Vec::new()
        };

        self.state.last_play_pause = Some(settled_at(now, &actions));
        actions
    }

    fn handle_left_tilt(&mut self, now: Duration) -> Vec<ModeAction> {
        debug!("left tilt detected");
        self.state.tick_counter = 0;

        let elapsed = elapsed_since(self.state.last_left_tilt, now);
        let actions = if self.is_double_tap(elapsed) {
            // Forget the previous tilt so a third one cannot chain
            self.state.last_left_tilt = None;
            self.cycle_sub_mode()
        } else {
            debug!(elapsed_ms = millis(elapsed), "single tilt");
            Vec::new()
        };

        self.state.last_left_tilt = Some(settled_at(now, &actions));
        actions
    }

    fn toggle(&mut self) -> Vec<ModeAction> {
        let confirm = self.config.confirm_delay();

        if self.state.enabled {
            info!("--> DEACTIVATING");
            self.state.enabled = false;
            vec![
                ModeAction::Send(Frame::steering(VOLUME_UP)),
                ModeAction::Delay(confirm),
                ModeAction::Send(Frame::steering(VOLUME_DOWN)),
                ModeAction::Delay(confirm),
                ModeAction::SetSafety(SafetyMode::Silent),
            ]
        } else {
            info!("--> ACTIVATING");
            self.state.enabled = true;
            let mut actions = vec![
                ModeAction::SetSafety(SafetyMode::AllowOutput),
                ModeAction::Send(Frame::steering(VOLUME_DOWN)),
                ModeAction::Delay(confirm),
                ModeAction::Send(Frame::steering(VOLUME_UP)),
            ];
            if self.state.parked {
                actions.push(ModeAction::SetSafety(SafetyMode::Silent));
            }
            actions
        }
    }

    fn cycle_sub_mode(&mut self) -> Vec<ModeAction> {
        self.state.sub_mode = self.state.sub_mode.next();
        info!(mode = %self.state.sub_mode, "--> MODE SWAP");

        let confirm = self.config.confirm_delay();
        let forced = !self.state.enabled;

        let mut actions = Vec::new();
        if forced {
            actions.push(ModeAction::SetSafety(SafetyMode::AllowOutput));
        }
        actions.extend([
            ModeAction::Send(Frame::steering(VOLUME_DOWN)),
            ModeAction::Delay(confirm),
            ModeAction::Send(Frame::steering(VOLUME_UP)),
            ModeAction::Delay(confirm),
        ]);
        if forced {
            actions.push(ModeAction::SetSafety(self.state.resting_safety()));
        }
        actions
    }

    fn is_double_tap(&self, elapsed: Option<Duration>) -> bool {
        elapsed.is_some_and(|e| e > self.config.double_tap_min && e < self.config.double_tap_max)
    }
}

impl Mode for AdvancedMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Advanced
    }

    fn on_connect(&mut self) -> Vec<ModeAction> {
        vec![ModeAction::SetSafety(self.state.resting_safety())]
    }

    fn handle_frame(&mut self, frame: &Frame, now: Duration) -> Vec<ModeAction> {
        if frame.bus != BUS_MAIN {
            return Vec::new();
        }

        match frame.id {
            CLOCK_ID => self.handle_clock_tick(&frame.data),
            STEERING_ID => self.handle_steering(&frame.data, now),
            GEAR_ID => self.handle_gear(&frame.data, now),
            _ => Vec::new(),
        }
    }
}

/// Time since `last`, or `None` if it never happened. Saturates at zero
/// when `last` lies in the future (handling of the previous press had not
/// settled yet).
fn elapsed_since(last: Option<Duration>, now: Duration) -> Option<Duration> {
    last.map(|t| now.saturating_sub(t))
}

/// Moment a gesture's handling completes: receipt time plus every fixed
/// wait the handling emitted.
fn settled_at(now: Duration, actions: &[ModeAction]) -> Duration {
    now + ModeAction::fixed_delay(actions)
}

fn millis(elapsed: Option<Duration>) -> Option<u64> {
    elapsed.map(|e| e.as_millis() as u64)
}
