//! Arbitration identifiers and bus indices.

/// Periodic vehicle clock broadcast. Used purely as a cadence pulse.
pub const CLOCK_ID: u32 = 0x528;

/// Steering wheel control panel (scroll wheels, tilt, play/pause).
pub const STEERING_ID: u32 = 0x3C2;

/// Gear selector position.
pub const GEAR_ID: u32 = 0x118;

/// Bus the steering controls and clock live on.
pub const BUS_MAIN: u8 = 0;

/// Secondary vehicle bus. Only configured, never listened to.
pub const BUS_VEHICLE: u8 = 1;

/// Default bus speed in kbit/s.
pub const DEFAULT_CAN_SPEED_KBPS: u32 = 500;
