//! Interface safety modes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Transmit policy enforced by the bus interface.
///
/// In [`SafetyMode::Silent`] the interface refuses to put anything on the
/// bus, so frames we attempt to send are dropped at the hardware boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyMode {
    /// Transmission allowed
    #[serde(rename = "alloutput")]
    AllowOutput,
    /// Listen only
    #[serde(rename = "silent")]
    Silent,
}

impl SafetyMode {
    /// Name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllowOutput => "alloutput",
            Self::Silent => "silent",
        }
    }
}

impl fmt::Display for SafetyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alloutput" => Ok(Self::AllowOutput),
            "silent" => Ok(Self::Silent),
            _ => Err(ProtocolError::UnknownSafetyMode(s.to_string())),
        }
    }
}
