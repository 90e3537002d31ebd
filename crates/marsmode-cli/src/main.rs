//! `marsmode` binary entry point.

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use marsmode_cli::{Args, execute};

fn main() -> ExitCode {
    let args = Args::parse();
    let mut stdout = io::stdout().lock();

    match execute(&args, &mut stdout) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let _ = writeln!(io::stderr(), "marsmode: {e}");
            ExitCode::FAILURE
        },
    }
}
