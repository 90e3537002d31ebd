//! Wire vocabulary for the marsmode bus tickler.
//!
//! The vehicle bus carries far more traffic than we care about. This crate
//! names the three identifiers we listen to (clock, steering controls, gear),
//! the handful of fixed steering payloads we inject, and the byte-prefix
//! matching used to recognize genuine button presses.
//!
//! Nothing here decodes the full vehicle protocol. Classification only looks
//! at the bytes it needs and treats everything else as opaque, so a frame we
//! do not understand is never an error, just something to skip.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod errors;
pub mod frame;
pub mod ids;
pub mod payloads;
pub mod safety;

pub use clock::parse_clock;
pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use ids::{BUS_MAIN, BUS_VEHICLE, CLOCK_ID, GEAR_ID, STEERING_ID};
pub use payloads::{GearEvidence, SteeringInput};
pub use safety::SafetyMode;
