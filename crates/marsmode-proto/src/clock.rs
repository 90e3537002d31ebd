//! Vehicle clock payload.
//!
//! The clock frame carries the current time as a big-endian count of seconds
//! since the Unix epoch. We only use the frame as a cadence pulse, so the
//! decoded value is informational (logged at debug level).

use crate::errors::{ProtocolError, Result};

/// Last second of year 9999. Anything beyond cannot be shown as a date.
pub const MAX_CLOCK_SECS: u64 = 253_402_300_799;

/// Decode a clock payload into seconds since the Unix epoch.
pub fn parse_clock(data: &[u8]) -> Result<u64> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyClockPayload);
    }

    // Frame payloads are capped at eight bytes, so this cannot overflow
    let secs = data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    if secs > MAX_CLOCK_SECS {
        return Err(ProtocolError::ClockOutOfRange(secs));
    }
    Ok(secs)
}
