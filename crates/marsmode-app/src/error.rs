//! Application error types.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while talking to the bus interface.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Operation attempted without a live connection.
    #[error("not connected to bus interface")]
    NotConnected,

    /// The driver reported a failure.
    #[error("bus interface error: {0}")]
    Bus(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ControllerError {
    pub(crate) fn bus<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Bus(Box::new(error))
    }
}

/// Errors raised while loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for [`crate::Config`].
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// Config could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config file could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
