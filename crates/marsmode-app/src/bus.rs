//! Bus interface trait for abstracting the hardware driver.
//!
//! The [`BusInterface`] trait decouples the delivery loop from the device
//! that physically talks to the vehicle. Production plugs in a USB driver,
//! the simulation harness plugs in a scripted bus, and the generic
//! [`crate::Controller`] handles all lifecycle logic.

use marsmode_proto::{Frame, SafetyMode};
use thiserror::Error;

/// Abstracts the USB-attached bus interface.
///
/// Calls are blocking. `receive` may return an empty batch when nothing is
/// pending.
pub trait BusInterface {
    /// Driver-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the device.
    ///
    /// # Errors
    ///
    /// Returns an error if no device answers.
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Configure the bit rate of one bus.
    fn set_bus_speed(&mut self, bus: u8, kbps: u32) -> Result<(), Self::Error>;

    /// Switch the transmit policy.
    fn set_safety_mode(&mut self, mode: SafetyMode) -> Result<(), Self::Error>;

    /// Put one frame on the bus.
    fn send(&mut self, frame: &Frame) -> Result<(), Self::Error>;

    /// Drain frames received since the last call.
    fn receive(&mut self) -> Result<Vec<Frame>, Self::Error>;

    /// Release the device.
    fn disconnect(&mut self) {}
}

/// Error returned by [`UnavailableBus`] for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no bus interface backend available in this build")]
pub struct BackendUnavailable;

/// Placeholder interface for builds without a hardware backend.
///
/// Every operation fails, so only dry-run sessions (which never touch the
/// interface) can make progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBus;

impl BusInterface for UnavailableBus {
    type Error = BackendUnavailable;

    fn connect(&mut self) -> Result<(), Self::Error> {
        Err(BackendUnavailable)
    }

    fn set_bus_speed(&mut self, _bus: u8, _kbps: u32) -> Result<(), Self::Error> {
        Err(BackendUnavailable)
    }

    fn set_safety_mode(&mut self, _mode: SafetyMode) -> Result<(), Self::Error> {
        Err(BackendUnavailable)
    }

    fn send(&mut self, _frame: &Frame) -> Result<(), Self::Error> {
        Err(BackendUnavailable)
    }

    fn receive(&mut self) -> Result<Vec<Frame>, Self::Error> {
        Err(BackendUnavailable)
    }
}
