//! Command dispatch.

use std::{io::Write, path::Path};

use marsmode_app::{
    BusInterface, Config, Controller, RunOutcome, Runtime, ShutdownFlag, UnavailableBus, build_mode,
};
use marsmode_core::{ModeKind, SystemEnv};
use tracing::{info, warn};

use crate::{Args, CliError, Command, logging, signal};

/// Run whatever `args` asks for, writing user-facing output to `out`.
///
/// Returns the process exit status.
///
/// # Errors
///
/// Returns [`CliError`] for bad arguments, config problems, a missing bus
/// backend, or failed terminal output.
pub fn execute(args: &Args, out: &mut impl Write) -> Result<u8, CliError> {
    match args.command()? {
        Command::List => {
            list(out)?;
            Ok(0)
        },
        Command::Status => {
            logging::init(args.verbose);
            let available = status(&mut UnavailableBus, out)?;
            Ok(if available { 0 } else { 1 })
        },
        Command::Run(_) => {
            let config = args.load_config()?;
            if let Some(path) = &args.save_config {
                save_config(&config, path, out)?;
                return Ok(0);
            }

            logging::init(config.verbose);
            let shutdown = ShutdownFlag::new();
            signal::spawn(shutdown.clone()).map_err(CliError::Signal)?;

            Ok(match run(&config, shutdown)? {
                RunOutcome::Stopped | RunOutcome::ShutdownRequested => 0,
                RunOutcome::ConnectFailed | RunOutcome::ReconnectFailed => 1,
            })
        },
    }
}

/// Print every mode with its description.
///
/// # Errors
///
/// Fails only if `out` does.
pub fn list(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Available modes:")?;
    writeln!(out)?;
    for kind in ModeKind::ALL {
        writeln!(out, "  {:<20} - {}", kind.as_str(), kind.description())?;
    }
    writeln!(out)?;
    writeln!(out, "Use 'marsmode <mode>' to run a mode.")
}

/// Try to open `bus` and report whether it answered.
///
/// # Errors
///
/// Fails only if `out` does.
pub fn status<B: BusInterface>(bus: &mut B, out: &mut impl Write) -> std::io::Result<bool> {
    match bus.connect() {
        Ok(()) => {
            bus.disconnect();
            writeln!(out, "Bus interface: available")?;
            Ok(true)
        },
        Err(e) => {
            writeln!(out, "Bus interface: unavailable ({e})")?;
            Ok(false)
        },
    }
}

/// Write `config` as TOML to `path`.
///
/// # Errors
///
/// Fails if the file cannot be written or `out` fails.
pub fn save_config(config: &Config, path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    config.save(path)?;
    writeln!(out, "Configuration saved to {}", path.display())?;
    Ok(())
}

/// Run the configured mode until it stops, fails or is interrupted.
///
/// # Errors
///
/// Returns [`CliError::NoBackend`] unless `config.dry_run` is set, since no
/// hardware backend is built into this binary.
pub fn run(config: &Config, shutdown: ShutdownFlag) -> Result<RunOutcome, CliError> {
    if !config.dry_run {
        warn!("no bus interface backend available");
        return Err(CliError::NoBackend);
    }

    info!(mode = %config.mode, can_speed_kbps = config.can_speed_kbps, "dry run, frames are logged only");
    let controller = Controller::with_shutdown(UnavailableBus, SystemEnv::new(), config.controller_config(), shutdown);
    let mut runtime = Runtime::new(controller, build_mode(config.mode, config), config.poll_interval());
    Ok(runtime.run(true))
}
