//! Argument parsing and config layering.

use std::path::PathBuf;

use clap::Parser;
use marsmode_app::Config;
use marsmode_core::{ModeError, ModeKind};
use marsmode_proto::SafetyMode;

use crate::CliError;

/// Keep the vehicle awake by injecting steering-wheel button frames.
#[derive(Debug, Clone, Parser)]
#[command(name = "marsmode", version, about)]
pub struct Args {
    /// Mode to run, `list` to show modes, or `status` to check the bus
    /// interface [default: from config, else media-volume-basic]
    pub mode: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log frames instead of sending them
    #[arg(short, long)]
    pub dry_run: bool,

    /// Load configuration from a TOML file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Save the effective configuration to a TOML file and exit
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<PathBuf>,

    /// Bus speed in kbps
    #[arg(long, value_name = "KBPS")]
    pub can_speed: Option<u32>,

    /// Safety mode applied on connect (alloutput or silent)
    #[arg(long, value_name = "MODE")]
    pub safety_mode: Option<SafetyMode>,
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the available modes.
    List,
    /// Check whether a bus interface answers.
    Status,
    /// Run a mode; `None` means the one named in the config.
    Run(Option<ModeKind>),
}

impl Args {
    /// Interpret the positional argument.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::UnknownMode`] for a name that is neither a mode
    /// nor a subcommand.
    pub fn command(&self) -> Result<Command, ModeError> {
        match self.mode.as_deref() {
            None => Ok(Command::Run(None)),
            Some("list") => Ok(Command::List),
            Some("status") => Ok(Command::Status),
            Some(name) => name.parse().map(|kind| Command::Run(Some(kind))),
        }
    }

    /// Effective configuration: defaults, then the config file, then flags.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be loaded, the mode name is unknown, or the
    /// layered result does not validate.
    pub fn load_config(&self) -> Result<Config, CliError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Override `config` with whatever was given on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::UnknownMode`] for an unknown mode name.
    pub fn apply(&self, config: &mut Config) -> Result<(), ModeError> {
        if let Command::Run(Some(kind)) = self.command()? {
            config.mode = kind;
        }
        config.verbose |= self.verbose;
        config.dry_run |= self.dry_run;
        if let Some(kbps) = self.can_speed {
            config.can_speed_kbps = kbps;
        }
        if let Some(mode) = self.safety_mode {
            config.safety_mode = mode;
        }
        Ok(())
    }
}
