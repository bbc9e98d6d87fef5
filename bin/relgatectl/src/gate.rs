//! ---
//! rg_section: "11-cli"
//! rg_subsection: "binary"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Control CLI for simulating, gating and reporting releases."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};
use relgate_common::DecisionMode;
use relgate_gate::{evaluate, GateConfig, GateSummary};
use relgate_scenario::load_results;

use crate::exit_code;

#[derive(Debug, Args)]
pub struct GateArgs {
    /// Directory holding the result set.
    #[arg(long, value_name = "DIR")]
    results: PathBuf,

    /// Minimum acceptable reliability.
    #[arg(long)]
    threshold: f64,

    #[arg(long, value_enum, default_value_t = ModeArg::Any)]
    mode: ModeArg,

    /// Variant to judge (e.g. norepl or repl); all variants when omitted.
    #[arg(long = "results-mode", value_name = "NAME")]
    results_mode: Option<String>,

    /// Comma separated endpoints to judge; all endpoints when omitted.
    #[arg(long, value_delimiter = ',')]
    filters: Vec<String>,

    /// Where to write the gate summary JSON.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Any,
    Mean,
}

impl From<ModeArg> for DecisionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Any => DecisionMode::Any,
            ModeArg::Mean => DecisionMode::Mean,
        }
    }
}

/// Evaluate the result set in `results`. Evaluation errors become a failing summary
/// whose reason is the error text; only a failed summary write is an `Err`.
pub fn judge(results: &Path, config: &GateConfig, summary_path: Option<&Path>) -> Result<GateSummary> {
    let summary = match load_results(results) {
        Ok(records) => match evaluate(&records, config) {
            Ok(verdict) => GateSummary::from_verdict(&verdict, config),
            Err(err) => GateSummary::from_error(config, &err),
        },
        Err(err) => GateSummary::from_error(config, &err),
    };
    if let Some(path) = summary_path {
        summary.write(path)?;
    }
    println!("{}", summary.reason);
    Ok(summary)
}

pub fn run(args: GateArgs) -> Result<ExitCode> {
    let config = GateConfig::new(args.threshold, args.mode.into())
        .with_filters(&args.filters)
        .with_variant(args.results_mode.as_deref());
    let summary = judge(&args.results, &config, args.summary.as_deref())?;
    Ok(exit_code(summary.passed))
}
