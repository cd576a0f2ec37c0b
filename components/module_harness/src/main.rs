//! Module test runner CLI
//!
//! Loads configuration, installs logging (stderr or `--logfile`) and runs
//! the batch. Exit code is 0 when every module passed, 1 when any failure
//! was recorded and 2 on an infrastructure error.

use clap::Parser as ClapParser;
use module_harness::{cli, Cli};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(cli::EXIT_ERROR);
        }
    };

    let log_file = match cli::open_log_file(&config) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(cli::EXIT_ERROR);
        }
    };
    let ansi = log_file.is_none();
    let writer = match log_file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = match std::env::var("RUST_LOG") {
        Ok(_) if cli.log_level.is_none() => EnvFilter::from_default_env(),
        _ => EnvFilter::new(&config.log_level),
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .with(filter)
        .init();

    let outcome = cli::execute(&config, cli.verbose);
    if let Err(e) = &outcome {
        eprintln!("Error: {}", e);
    }
    std::process::exit(cli::exit_code(&outcome));
}
