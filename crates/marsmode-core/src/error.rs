//! Mode error types.

use thiserror::Error;

/// Errors raised when selecting a mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// Mode name not in the registry.
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}
