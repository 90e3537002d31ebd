//! marsmode core logic
//!
//! Pure state machines that decide which steering frames to inject, completely
//! decoupled from I/O. This enables deterministic testing of timing-based
//! gestures without a vehicle or a bus interface attached.
//!
//! # Architecture
//!
//! Every mode is a deterministic state machine isolated from I/O, wall-clock
//! time, randomness and scheduling. Time is supplied by the caller as a
//! monotonic [`std::time::Duration`] since the start of the run.
//!
//! State transitions produce declarative [`ModeAction`]s (send a frame,
//! change the safety mode, wait) rather than executing them directly. The
//! runtime in `marsmode-app` interprets the actions against a real or
//! simulated bus.
//!
//! # Components
//!
//! - [`advanced`]: gesture-driven mode with park detection
//! - [`clock_sync`]: modes paced by the vehicle clock broadcast
//! - [`blind`]: modes paced by random sleeps alone
//! - [`mode`]: the [`Mode`] capability and [`ModeKind`] registry names
//! - [`mod@env`]: environment abstraction (time, sleep, RNG)
//! - [`error`]: mode error types

pub mod action;
pub mod advanced;
pub mod blind;
pub mod clock_sync;
pub mod env;
pub mod error;
pub mod mode;

pub use action::ModeAction;
pub use advanced::{AdvancedConfig, AdvancedMode, ModeState, SubMode};
pub use blind::{BlindTickle, BlindTickleConfig};
pub use clock_sync::{ClockSync, ClockSyncConfig};
pub use env::{Environment, SystemEnv};
pub use error::ModeError;
pub use mode::{Mode, ModeKind};
