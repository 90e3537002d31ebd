//! Protocol-level errors.

use thiserror::Error;

/// Convenience alias for results carrying a [`ProtocolError`].
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while building or interpreting bus frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Classic CAN frames carry at most eight data bytes.
    #[error("payload too long: {len} bytes (max {max})")]
    PayloadTooLong {
        /// Length of the rejected payload
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// Clock frame carried no bytes to interpret.
    #[error("empty clock payload")]
    EmptyClockPayload,

    /// Clock value does not fit in a representable calendar date.
    #[error("clock value {0} out of range")]
    ClockOutOfRange(u64),

    /// Safety mode name not recognized.
    #[error("unknown safety mode: {0}")]
    UnknownSafetyMode(String),
}
