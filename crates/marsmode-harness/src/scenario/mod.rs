//! Scenario testing with mandatory oracles.
//!
//! A [`Scenario`] binds one mode to a scripted bus timeline, runs it through
//! the real [`marsmode_app::Runtime`] on virtual time, and hands the final
//! [`World`] to an oracle. A scenario without an oracle cannot be run.

mod builder;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::World;

/// Verification function run against the final world.
pub type OracleFn<M> = Box<dyn Fn(&World<M>) -> Result<(), String>>;
