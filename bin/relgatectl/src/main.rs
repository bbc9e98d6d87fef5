//! ---
//! rg_section: "11-cli"
//! rg_subsection: "binary"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Control CLI for simulating, gating and reporting releases."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand};
use relgate_logging as logging;

mod gate;
mod pipeline;
mod report;
mod simulate;
mod variants;

/// Exit status for a failed gate or a partially failed simulation.
const EXIT_FAILED: u8 = 1;
/// Exit status for unusable input or I/O failures.
const EXIT_ERROR: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Reliability simulation and release gating for microservice call graphs",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Simulate every topology variant at every failure prior and write a result set.
    Simulate(simulate::SimulateArgs),
    /// Judge a result set against a reliability threshold.
    Gate(gate::GateArgs),
    /// Assemble report.json and CSV exports from a result set and gate summary.
    Report(report::ReportArgs),
    /// Run simulate, gate and report from a configuration file.
    Run(pipeline::RunArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.version {
        println!("relgatectl {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    match dispatch(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn dispatch(command: Option<Commands>) -> Result<ExitCode> {
    let command = command.ok_or_else(|| anyhow!("a subcommand is required; see --help"))?;
    // `run` installs the configured file subscriber itself.
    if !matches!(command, Commands::Run(_)) {
        logging::init();
    }
    match command {
        Commands::Simulate(args) => simulate::run(args),
        Commands::Gate(args) => gate::run(args),
        Commands::Report(args) => report::run(args),
        Commands::Run(args) => pipeline::run(args),
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    }
}
