//! Deterministic simulation harness for marsmode.
//!
//! Virtual-clock implementations of the Environment and BusInterface traits
//! so the delivery loop, the runtime and every mode can be exercised end to
//! end without hardware and without waiting in real time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod scenario;
pub mod sim_bus;
pub mod sim_env;

pub use scenario::{OracleFn, RunnableScenario, Scenario, World};
pub use sim_bus::{SimBus, SimBusError};
pub use sim_env::SimEnv;
