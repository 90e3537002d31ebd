//! Bus frame representation.

use std::fmt;

use crate::{
    errors::{ProtocolError, Result},
    ids::{BUS_MAIN, STEERING_ID},
};

/// A single frame as seen on (or destined for) the vehicle bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Arbitration identifier
    pub id: u32,
    /// Data bytes, at most [`Frame::MAX_PAYLOAD`]
    pub data: Vec<u8>,
    /// Bus index the frame was seen on or should be sent to
    pub bus: u8,
}

impl Frame {
    /// Classic CAN payload limit.
    pub const MAX_PAYLOAD: usize = 8;

    /// Build a frame, rejecting oversized payloads.
    pub fn new(id: u32, data: impl Into<Vec<u8>>, bus: u8) -> Result<Self> {
        let data = data.into();
        if data.len() > Self::MAX_PAYLOAD {
            return Err(ProtocolError::PayloadTooLong { len: data.len(), max: Self::MAX_PAYLOAD });
        }
        Ok(Self { id, data, bus })
    }

    /// Steering control frame on the main bus. Infallible: the payload is a
    /// fixed eight-byte array.
    pub fn steering(payload: [u8; 8]) -> Self {
        Self { id: STEERING_ID, data: payload.to_vec(), bus: BUS_MAIN }
    }

    /// First two payload bytes, if present.
    pub fn prefix(&self) -> Option<[u8; 2]> {
        match self.data.as_slice() {
            [a, b, ..] => Some([*a, *b]),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03X}@{}: {}", self.id, self.bus, hex::encode(&self.data))
    }
}
