//! Configuration model and file I/O.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Unknown keys are rejected to catch typos. Durations
//! are stored as seconds in floating point, matching how people write them
//! by hand, and converted to [`Duration`] at the edges.

use std::{fs, path::Path, time::Duration};

use marsmode_core::{AdvancedConfig, BlindTickleConfig, ClockSyncConfig, ModeKind};
use marsmode_proto::{SafetyMode, ids::DEFAULT_CAN_SPEED_KBPS};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ControllerConfig};

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Mode to run
    pub mode: ModeKind,
    /// Bit rate applied to both buses
    pub can_speed_kbps: u32,
    /// Transmit policy applied on connect
    pub safety_mode: SafetyMode,
    /// Debug-level logging
    pub verbose: bool,
    /// Log actions instead of touching the interface
    pub dry_run: bool,
    /// Sleep between loop iterations, in milliseconds
    pub poll_interval_ms: u64,

    /// Shortest wait between blind volume pairs (seconds)
    pub volume_interval_min: f64,
    /// Longest wait between blind volume pairs (seconds)
    pub volume_interval_max: f64,
    /// Gap inside a volume pair (seconds)
    pub volume_delay: f64,
    /// Shortest wait between blind speed pairs (seconds)
    pub speed_interval_min: f64,
    /// Longest wait between blind speed pairs (seconds)
    pub speed_interval_max: f64,
    /// Gap inside a speed pair (seconds)
    pub speed_delay: f64,

    /// Clock ticks per cycle for clock-synchronized volume and speed modes
    pub clock_tick_steps: u32,
    /// Clock ticks per cycle for media-back mode
    pub media_back_steps: u32,

    /// Frames in the advanced-mode startup signal
    pub startup_signal_count: u32,
    /// Wait after every startup frame (seconds)
    pub startup_signal_delay: f64,
    /// Lower bound of the double-tap window (seconds)
    pub double_tap_min: f64,
    /// Upper bound of the double-tap window (seconds)
    pub double_tap_max: f64,
    /// Clock ticks between advanced-mode tickles
    pub tickle_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeKind::default(),
            can_speed_kbps: DEFAULT_CAN_SPEED_KBPS,
            safety_mode: SafetyMode::AllowOutput,
            verbose: false,
            dry_run: false,
            poll_interval_ms: 1,
            volume_interval_min: 4.0,
            volume_interval_max: 8.0,
            volume_delay: 0.3,
            speed_interval_min: 4.0,
            speed_interval_max: 8.0,
            speed_delay: 0.3,
            clock_tick_steps: 8,
            media_back_steps: 5,
            startup_signal_count: 4,
            startup_signal_delay: 0.5,
            double_tap_min: 0.20,
            double_tap_max: 0.75,
            tickle_interval: 5,
        }
    }
}

impl Config {
    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::Parse`] on malformed TOML or unknown keys
    /// - [`ConfigError::Invalid`] if a value is out of range
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Self =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] or [`ConfigError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("volume_interval_min", self.volume_interval_min),
            ("volume_interval_max", self.volume_interval_max),
            ("volume_delay", self.volume_delay),
            ("speed_interval_min", self.speed_interval_min),
            ("speed_interval_max", self.speed_interval_max),
            ("speed_delay", self.speed_delay),
            ("startup_signal_delay", self.startup_signal_delay),
            ("double_tap_min", self.double_tap_min),
            ("double_tap_max", self.double_tap_max),
        ];
        for (name, secs) in durations {
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid(format!("{name} must be a non-negative number of seconds, got {secs}")));
            }
        }

        let ranges = [
            ("volume_interval", self.volume_interval_min, self.volume_interval_max),
            ("speed_interval", self.speed_interval_min, self.speed_interval_max),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(invalid(format!("{name}_min ({min}) exceeds {name}_max ({max})")));
            }
        }
        if self.double_tap_min >= self.double_tap_max {
            return Err(invalid(format!(
                "double_tap_min ({}) must be below double_tap_max ({})",
                self.double_tap_min, self.double_tap_max
            )));
        }

        if self.can_speed_kbps == 0 {
            return Err(invalid("can_speed_kbps must be positive".to_string()));
        }
        if self.tickle_interval == 0 {
            return Err(invalid("tickle_interval must be at least 1".to_string()));
        }
        if self.clock_tick_steps < 2 {
            return Err(invalid(format!("clock_tick_steps must be at least 2, got {}", self.clock_tick_steps)));
        }
        if self.media_back_steps == 0 {
            return Err(invalid("media_back_steps must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Connection parameters for the delivery loop.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig { can_speed_kbps: self.can_speed_kbps, safety_mode: self.safety_mode, dry_run: self.dry_run }
    }

    /// Sleep between loop iterations.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settings for the advanced mode.
    pub fn advanced(&self) -> AdvancedConfig {
        AdvancedConfig {
            startup_signal_count: self.startup_signal_count,
            startup_signal_delay: secs(self.startup_signal_delay),
            tickle_interval: self.tickle_interval,
            double_tap_min: secs(self.double_tap_min),
            double_tap_max: secs(self.double_tap_max),
            volume_delay: secs(self.volume_delay),
            speed_delay: secs(self.speed_delay),
        }
    }

    /// Settings for a blind timer mode, if `kind` is one.
    pub fn blind(&self, kind: ModeKind) -> Option<BlindTickleConfig> {
        match kind {
            ModeKind::MediaVolumeBasic => Some(BlindTickleConfig::media_volume(
                secs(self.volume_delay),
                secs(self.volume_interval_min),
                secs(self.volume_interval_max),
            )),
            ModeKind::SpeedBasic => Some(BlindTickleConfig::speed(
                secs(self.speed_delay),
                secs(self.speed_interval_min),
                secs(self.speed_interval_max),
            )),
            _ => None,
        }
    }

    /// Settings for a clock-synchronized mode, if `kind` is one.
    pub fn clock_sync(&self, kind: ModeKind) -> Option<ClockSyncConfig> {
        match kind {
            ModeKind::MediaVolume => Some(ClockSyncConfig::media_volume(self.clock_tick_steps)),
            ModeKind::Speed => Some(ClockSyncConfig::speed(self.clock_tick_steps)),
            ModeKind::MediaBack => Some(ClockSyncConfig::media_back(self.media_back_steps)),
            _ => None,
        }
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

/// Out-of-range values collapse to zero; [`Config::validate`] reports them.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}
