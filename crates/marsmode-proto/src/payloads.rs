//! Fixed steering payloads and inbound payload classification.
//!
//! Outbound payloads are the exact eight bytes the steering controls emit
//! for the corresponding button. Inbound classification only inspects the
//! bytes listed here; the remainder of each payload is ignored.

/// Left scroll wheel down (volume down).
pub const VOLUME_DOWN: [u8; 8] = [0x29, 0x55, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Left scroll wheel up (volume up).
pub const VOLUME_UP: [u8; 8] = [0x29, 0x55, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Right scroll wheel down (set speed down).
pub const SPEED_DOWN: [u8; 8] = [0x29, 0x55, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00];

/// Right scroll wheel up (set speed up).
pub const SPEED_UP: [u8; 8] = [0x29, 0x55, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Left wheel tilt (media back).
pub const MEDIA_BACK: [u8; 8] = [0x29, 0x95, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Leading bytes of a left wheel press (play/pause).
pub const PLAY_PAUSE_PREFIX: [u8; 2] = [0x49, 0x55];

/// Leading bytes of a left wheel tilt.
pub const LEFT_TILT_PREFIX: [u8; 2] = [0x29, 0x95];

/// Gear byte values at or below this read as park.
pub const PARK_LOW_MAX: u8 = 50;

/// Gear byte values at or above this read as park.
pub const PARK_HIGH_MIN: u8 = 240;

/// Index of the gear byte in a gear frame.
pub const GEAR_BYTE: usize = 2;

/// Genuine steering input we react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringInput {
    /// Left wheel pressed
    PlayPause,
    /// Left wheel tilted
    LeftTilt,
}

impl SteeringInput {
    /// Classify a steering payload by its first two bytes.
    ///
    /// Returns `None` for short payloads and for any other control.
    pub fn classify(data: &[u8]) -> Option<Self> {
        match data {
            [a, b, ..] if [*a, *b] == PLAY_PAUSE_PREFIX => Some(Self::PlayPause),
            [a, b, ..] if [*a, *b] == LEFT_TILT_PREFIX => Some(Self::LeftTilt),
            _ => None,
        }
    }
}

/// What a gear frame says about vehicle motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GearEvidence {
    /// Parked (or a transitional value that reads like park)
    Park,
    /// Any drive-capable gear
    Drive,
}

impl GearEvidence {
    /// Interpret byte 2 of a gear payload.
    ///
    /// Returns `None` when the payload is too short to carry a gear byte.
    pub fn classify(data: &[u8]) -> Option<Self> {
        data.get(GEAR_BYTE).map(|&value| Self::from_gear_byte(value))
    }

    /// Map a raw gear byte to evidence.
    pub fn from_gear_byte(value: u8) -> Self {
        if value <= PARK_LOW_MAX || value >= PARK_HIGH_MIN { Self::Park } else { Self::Drive }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn payload_constants_match_wire_captures() {
        assert_eq!(VOLUME_DOWN, hex!("29553F0000000000"));
        assert_eq!(VOLUME_UP, hex!("2955010000000000"));
        assert_eq!(SPEED_DOWN, hex!("2955003F00000000"));
        assert_eq!(SPEED_UP, hex!("2955000100000000"));
        assert_eq!(MEDIA_BACK, hex!("2995000000000000"));
    }

    #[test]
    fn classify_play_pause() {
        assert_eq!(SteeringInput::classify(&hex!("4955000000000000")), Some(SteeringInput::PlayPause));
    }

    #[test]
    fn classify_left_tilt() {
        // Our own media-back injection reads as a tilt too
        assert_eq!(SteeringInput::classify(&MEDIA_BACK), Some(SteeringInput::LeftTilt));
    }

    #[test]
    fn volume_scroll_is_not_a_gesture() {
        assert_eq!(SteeringInput::classify(&VOLUME_DOWN), None);
    }

    #[test]
    fn short_steering_payload_ignored() {
        assert_eq!(SteeringInput::classify(&[0x49]), None);
        assert_eq!(SteeringInput::classify(&[]), None);
    }

    #[test]
    fn gear_thresholds_are_inclusive() {
        assert_eq!(GearEvidence::from_gear_byte(50), GearEvidence::Park);
        assert_eq!(GearEvidence::from_gear_byte(51), GearEvidence::Drive);
        assert_eq!(GearEvidence::from_gear_byte(239), GearEvidence::Drive);
        assert_eq!(GearEvidence::from_gear_byte(240), GearEvidence::Park);
    }

    #[test]
    fn short_gear_payload_ignored() {
        assert_eq!(GearEvidence::classify(&[0, 0]), None);
        assert_eq!(GearEvidence::classify(&[0, 0, 128]), Some(GearEvidence::Drive));
    }

    proptest! {
        #[test]
        fn prop_gear_evidence_partitions_byte_range(value in any::<u8>()) {
            let evidence = GearEvidence::from_gear_byte(value);
            let park = value <= PARK_LOW_MAX || value >= PARK_HIGH_MIN;
            prop_assert_eq!(evidence == GearEvidence::Park, park);
        }

        #[test]
        fn prop_only_known_prefixes_classify(a in any::<u8>(), b in any::<u8>(), rest in prop::collection::vec(any::<u8>(), 0..6)) {
            let mut data = vec![a, b];
            data.extend(rest);
            let known = [a, b] == PLAY_PAUSE_PREFIX || [a, b] == LEFT_TILT_PREFIX;
            prop_assert_eq!(SteeringInput::classify(&data).is_some(), known);
        }
    }
}
