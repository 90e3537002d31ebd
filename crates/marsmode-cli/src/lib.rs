//! Command-line front end for marsmode
//!
//! A thin shell over [`marsmode_app::Runtime`]: argument parsing, layering
//! flags over the config file, logging setup and signal handling. All
//! lifecycle logic lives in `marsmode-app`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod signal;

pub use cli::{Args, Command};
pub use commands::execute;
pub use error::CliError;
