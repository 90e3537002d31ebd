//! Modes paced by the vehicle clock broadcast.
//!
//! The clock frame arrives at a steady rate while the vehicle is awake, so
//! counting clock frames gives a cadence that follows the vehicle rather
//! than the host. Every `steps` ticks the mode sends its trigger frame,
//! optionally preceded one tick earlier by a lead frame.

use std::time::Duration;

use marsmode_proto::{
    BUS_MAIN, CLOCK_ID, Frame, parse_clock,
    payloads::{MEDIA_BACK, SPEED_DOWN, SPEED_UP, VOLUME_DOWN, VOLUME_UP},
};
use tracing::debug;

use crate::{
    action::ModeAction,
    mode::{Mode, ModeKind},
};

/// Clock-synchronized mode configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSyncConfig {
    /// Registry name reported by the mode
    pub kind: ModeKind,
    /// Ticks per cycle
    pub steps: u32,
    /// Sent on tick `steps - 1`, if any
    pub lead: Option<[u8; 8]>,
    /// Sent on tick `steps`, which also restarts the count
    pub trigger: [u8; 8],
    /// Count only clock frames seen on the main bus
    pub main_bus_only: bool,
}

impl ClockSyncConfig {
    /// Volume up one tick early, volume down on the beat.
    pub fn media_volume(steps: u32) -> Self {
        Self {
            kind: ModeKind::MediaVolume,
            steps,
            lead: Some(VOLUME_UP),
            trigger: VOLUME_DOWN,
            main_bus_only: true,
        }
    }

    /// Speed down one tick early, speed up on the beat.
    pub fn speed(steps: u32) -> Self {
        Self {
            kind: ModeKind::Speed,
            steps,
            lead: Some(SPEED_DOWN),
            trigger: SPEED_UP,
            main_bus_only: false,
        }
    }

    /// Media back on the beat.
    pub fn media_back(steps: u32) -> Self {
        Self { kind: ModeKind::MediaBack, steps, lead: None, trigger: MEDIA_BACK, main_bus_only: false }
    }
}

/// Clock-synchronized mode state machine
#[derive(Debug, Clone)]
pub struct ClockSync {
    config: ClockSyncConfig,
    step_count: u32,
}

impl ClockSync {
    /// Create the mode with a zeroed tick count.
    pub fn new(config: ClockSyncConfig) -> Self {
        Self { config, step_count: 0 }
    }

    /// Ticks counted in the current cycle.
    pub fn step_count(&self) -> u32 {
        self.step_count
    }
}

impl Mode for ClockSync {
    fn kind(&self) -> ModeKind {
        self.config.kind
    }

    fn handle_frame(&mut self, frame: &Frame, _now: Duration) -> Vec<ModeAction> {
        if frame.id != CLOCK_ID || (self.config.main_bus_only && frame.bus != BUS_MAIN) {
            return Vec::new();
        }

        self.step_count += 1;
        match parse_clock(&frame.data) {
            Ok(secs) => debug!(secs, "car clock"),
            Err(e) => debug!(error = %e, "invalid clock data"),
        }

        if let Some(lead) = self.config.lead
            && self.step_count + 1 == self.config.steps
        {
            return vec![ModeAction::Send(Frame::steering(lead))];
        }

        if self.step_count >= self.config.steps {
            debug!(mode = %self.config.kind, "sent clock-synchronized event");
            self.step_count = 0;
            return vec![ModeAction::Send(Frame::steering(self.config.trigger))];
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use marsmode_proto::{BUS_VEHICLE, STEERING_ID};

    use super::*;

    fn clock(bus: u8) -> Frame {
        Frame::new(CLOCK_ID, vec![0x65, 0x53, 0xF1, 0x00], bus).unwrap()
    }

    fn run(mode: &mut ClockSync, ticks: usize, bus: u8) -> Vec<Option<Frame>> {
        (0..ticks)
            .map(|i| {
                let actions = mode.handle_frame(&clock(bus), Duration::from_secs(i as u64));
                ModeAction::frames(&actions).next().cloned()
            })
            .collect()
    }

    #[test]
    fn media_volume_lead_then_trigger() {
        let mut mode = ClockSync::new(ClockSyncConfig::media_volume(8));
        let sent = run(&mut mode, 16, BUS_MAIN);

        assert_eq!(sent[6], Some(Frame::steering(VOLUME_UP)));
        assert_eq!(sent[7], Some(Frame::steering(VOLUME_DOWN)));
        assert_eq!(sent[14], Some(Frame::steering(VOLUME_UP)));
        assert_eq!(sent[15], Some(Frame::steering(VOLUME_DOWN)));
        assert_eq!(sent.iter().flatten().count(), 4);
    }

    #[test]
    fn media_volume_ignores_vehicle_bus() {
        let mut mode = ClockSync::new(ClockSyncConfig::media_volume(8));
        let sent = run(&mut mode, 16, BUS_VEHICLE);
        assert!(sent.iter().all(Option::is_none));
        assert_eq!(mode.step_count(), 0);
    }

    #[test]
    fn speed_counts_any_bus() {
        let mut mode = ClockSync::new(ClockSyncConfig::speed(4));
        let sent = run(&mut mode, 4, BUS_VEHICLE);
        assert_eq!(sent[2], Some(Frame::steering(SPEED_DOWN)));
        assert_eq!(sent[3], Some(Frame::steering(SPEED_UP)));
    }

    #[test]
    fn media_back_has_no_lead() {
        let mut mode = ClockSync::new(ClockSyncConfig::media_back(5));
        let sent = run(&mut mode, 10, BUS_MAIN);
        let hits: Vec<usize> =
            sent.iter().enumerate().filter(|(_, f)| f.is_some()).map(|(i, _)| i).collect();
        assert_eq!(hits, vec![4, 9]);
        assert_eq!(sent[4], Some(Frame::steering(MEDIA_BACK)));
    }

    #[test]
    fn malformed_clock_still_counts() {
        let mut mode = ClockSync::new(ClockSyncConfig::media_back(2));
        let empty = Frame::new(CLOCK_ID, vec![], BUS_MAIN).unwrap();
        mode.handle_frame(&empty, Duration::ZERO);
        let actions = mode.handle_frame(&empty, Duration::ZERO);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn non_clock_frames_ignored() {
        let mut mode = ClockSync::new(ClockSyncConfig::media_back(1));
        let frame = Frame::new(STEERING_ID, vec![0x49, 0x55], BUS_MAIN).unwrap();
        assert!(mode.handle_frame(&frame, Duration::ZERO).is_empty());
        assert_eq!(mode.step_count(), 0);
    }
}
