//! CLI error type.

use std::io;

use marsmode_app::ConfigError;
use marsmode_core::ModeError;
use thiserror::Error;

/// Anything that stops the binary before or instead of running a mode.
#[derive(Debug, Error)]
pub enum CliError {
    /// Unknown mode name on the command line.
    #[error(transparent)]
    Mode(#[from] ModeError),

    /// Config file could not be loaded, validated or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A real session was requested but no hardware backend is built in.
    #[error("no bus interface backend is available in this build (run with --dry-run)")]
    NoBackend,

    /// Writing to the terminal failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    /// The signal handler thread could not be started.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}
