use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::{
    check::{self, CheckArgs},
    run::{self, RunArgs},
    schema::{self, SchemaArgs},
};
use logging::{init_logging, LogConfig, LogFormat};
use tracing::error;

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "evs-sim", about = "Event-shape gen/rec mini-tree producer")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Prefix log lines with timestamps.
    #[arg(long, global = true)]
    log_timestamps: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process an event table and write the mini-tree, plots and run summary.
    Run(RunArgs),
    /// Print the persisted mini-tree columns.
    Schema(SchemaArgs),
    /// Validate a run configuration and print its hash.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format)
        .with_timestamps(cli.log_timestamps)
        .with_log_file(cli.log_file.clone());
    if let Err(err) = init_logging(&log_config) {
        eprintln!("failed to initialise logging: {err}");
        return ExitCode::FAILURE;
    }
    match dispatch(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: &Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Schema(args) => schema::run(args),
        Command::Check(args) => check::run(args),
    }
}
