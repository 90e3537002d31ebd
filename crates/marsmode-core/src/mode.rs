//! The mode capability and registry names.

use std::{fmt, str::FromStr, time::Duration};

use marsmode_proto::Frame;
use serde::{Deserialize, Serialize};

use crate::{action::ModeAction, error::ModeError};

/// A keep-awake strategy.
///
/// Implementations are pure state machines: every method receives the
/// current time, mutates internal state and returns the actions the runtime
/// must execute. None of them perform I/O.
pub trait Mode {
    /// Registry name of this mode.
    fn kind(&self) -> ModeKind;

    /// Actions to run after every successful (re)connect.
    ///
    /// Connecting applies the configured initial safety mode, which may not
    /// be what the mode currently wants.
    fn on_connect(&mut self) -> Vec<ModeAction> {
        Vec::new()
    }

    /// React to one received frame.
    fn handle_frame(&mut self, frame: &Frame, now: Duration) -> Vec<ModeAction>;

    /// Called once per loop iteration after the received batch is handled.
    fn poll(&mut self, _now: Duration) -> Vec<ModeAction> {
        Vec::new()
    }
}

impl<M: Mode + ?Sized> Mode for Box<M> {
    fn kind(&self) -> ModeKind {
        (**self).kind()
    }

    fn on_connect(&mut self) -> Vec<ModeAction> {
        (**self).on_connect()
    }

    fn handle_frame(&mut self, frame: &Frame, now: Duration) -> Vec<ModeAction> {
        (**self).handle_frame(frame, now)
    }

    fn poll(&mut self, now: Duration) -> Vec<ModeAction> {
        (**self).poll(now)
    }
}

/// Selectable modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeKind {
    /// Volume down/up on a random timer
    #[default]
    MediaVolumeBasic,
    /// Volume down/up paced by clock ticks
    MediaVolume,
    /// Set-speed down/up on a random timer
    SpeedBasic,
    /// Set-speed down/up paced by clock ticks
    Speed,
    /// Media back paced by clock ticks
    MediaBack,
    /// Gesture-controlled multi-mode with park detection
    Advanced,
}

impl ModeKind {
    /// Every mode, in registry order.
    pub const ALL: [Self; 6] = [
        Self::MediaVolumeBasic,
        Self::MediaVolume,
        Self::SpeedBasic,
        Self::Speed,
        Self::MediaBack,
        Self::Advanced,
    ];

    /// Registry name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MediaVolumeBasic => "media-volume-basic",
            Self::MediaVolume => "media-volume",
            Self::SpeedBasic => "speed-basic",
            Self::Speed => "speed",
            Self::MediaBack => "media-back",
            Self::Advanced => "advanced",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            Self::MediaVolumeBasic => "Basic media volume control with random sleep timing",
            Self::MediaVolume => "Media volume synchronized to vehicle clock ticks (0x528)",
            Self::SpeedBasic => "Basic set-speed adjustment with random timing",
            Self::Speed => "Set-speed adjustment synchronized to vehicle clock ticks",
            Self::MediaBack => "Media back button for the streaming app (clock-based)",
            Self::Advanced => "Multi-mode with gesture controls and park detection",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKind {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModeError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ModeKind::ALL {
            assert_eq!(kind.as_str().parse::<ModeKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_name_rejected() {
        assert_eq!("turbo".parse::<ModeKind>(), Err(ModeError::UnknownMode("turbo".into())));
    }

    #[test]
    fn default_is_media_volume_basic() {
        assert_eq!(ModeKind::default(), ModeKind::MediaVolumeBasic);
    }
}
