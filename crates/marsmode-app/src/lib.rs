//! Application layer for marsmode
//!
//! Connection lifecycle, action execution and configuration around the pure
//! mode state machines in `marsmode-core`, generic over the bus interface
//! and the environment so the same code runs against hardware and inside
//! the simulation harness.
//!
//! # Components
//!
//! - [`BusInterface`]: Trait for the external bus driver
//! - [`Controller`]: Delivery loop (connect, exception budget, reconnect,
//!   guaranteed cleanup)
//! - [`Runtime`]: Drives one [`marsmode_core::Mode`] through a controller
//! - [`Config`]: Configuration model, file load/save and mode registry

mod bus;
mod config;
mod controller;
mod error;
mod registry;
mod runtime;
mod shutdown;

pub use bus::{BackendUnavailable, BusInterface, UnavailableBus};
pub use config::Config;
pub use controller::{Controller, ControllerConfig, MAX_EXCEPTION_COUNT, RECONNECT_DELAY, RunOutcome};
pub use error::{ConfigError, ControllerError};
pub use registry::build_mode;
pub use runtime::Runtime;
pub use shutdown::ShutdownFlag;
