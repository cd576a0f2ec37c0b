//! Command-line interface for the `run-modules` binary

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::report::{JsonReporter, SummaryReporter};
use crate::run::{RunSummary, TestRun};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Exit code when every module passed
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when any load or runtime failure was recorded
pub const EXIT_FAILURES: i32 = 1;
/// Exit code for infrastructure errors
pub const EXIT_ERROR: i32 = 2;

/// Run script test modules with per-module failure isolation
#[derive(Parser, Debug, Default)]
#[command(name = "run-modules", version = env!("CARGO_PKG_VERSION"), about)]
pub struct Cli {
    /// Module file or directory (overrides `test_path`)
    pub path: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only run tests whose name contains this
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Write a JSON report to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Host used in resource URLs
    #[arg(long)]
    pub host: Option<String>,

    /// Port used in resource URLs
    #[arg(long)]
    pub port: Option<u16>,

    /// Script call depth limit
    #[arg(long)]
    pub max_call_depth: Option<usize>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write log output to this file instead of stderr
    #[arg(long = "logfile", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// List every failure after the summary
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration file values with command-line overrides applied
    pub fn resolve_config(&self) -> HarnessResult<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(path) = &self.path {
            config.test_path = Some(path.clone());
        }
        if let Some(filter) = &self.filter {
            config.filter = Some(filter.clone());
        }
        if let Some(report) = &self.report {
            config.report_path = Some(report.clone());
        }
        if let Some(host) = &self.host {
            config.resource_host = host.clone();
        }
        if let Some(port) = self.port {
            config.resource_port = port;
        }
        if let Some(depth) = self.max_call_depth {
            config.max_call_depth = depth;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run the batch described by `config`, printing a summary to stdout
pub fn execute(config: &HarnessConfig, verbose: bool) -> HarnessResult<RunSummary> {
    let path = config
        .test_path
        .clone()
        .ok_or_else(|| HarnessError::InvalidValue {
            field: "test_path",
            value: String::new(),
        })?;

    let stdout = std::io::stdout();
    let mut run = TestRun::from_config(config)
        .with_reporter(SummaryReporter::new(stdout.lock()).verbose(verbose));

    if let Some(report_path) = &config.report_path {
        let file = File::create(report_path).map_err(|err| HarnessError::io(report_path, err))?;
        run = run.with_reporter(JsonReporter::new(BufWriter::new(file)));
    }

    run.run_path(&path)
}

/// Create the configured log file, truncating an existing one
pub fn open_log_file(config: &HarnessConfig) -> HarnessResult<Option<File>> {
    config
        .log_file
        .as_ref()
        .map(|path| File::create(path).map_err(|err| HarnessError::io(path, err)))
        .transpose()
}

/// Map a run outcome to a process exit code
pub fn exit_code(outcome: &HarnessResult<RunSummary>) -> i32 {
    match outcome {
        Ok(summary) if summary.is_success() => EXIT_SUCCESS,
        Ok(_) => EXIT_FAILURES,
        Err(_) => EXIT_ERROR,
    }
}
