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

use anyhow::{Context, Result};
use clap::Args;
use relgate_gate::GateSummary;
use relgate_report::{assemble_with, ReportExporter, ReportOptions};
use relgate_scenario::load_results;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Directory holding the result set.
    #[arg(long, value_name = "DIR")]
    results: PathBuf,

    /// Gate summary JSON to embed; skipped when missing.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Output directory for report.json and the CSV exports.
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Variant used as the comparison baseline.
    #[arg(long, value_name = "NAME")]
    baseline: Option<String>,

    /// Variant compared against the baseline.
    #[arg(long, value_name = "NAME")]
    candidate: Option<String>,
}

pub fn render(
    results: &Path,
    summary: Option<&Path>,
    options: &ReportOptions,
    out: &Path,
) -> Result<Vec<PathBuf>> {
    let records = load_results(results)
        .with_context(|| format!("failed to load results from {}", results.display()))?;
    let verdict = match summary.filter(|path| path.exists()) {
        Some(path) => Some(
            GateSummary::load(path)
                .with_context(|| format!("failed to read gate summary {}", path.display()))?,
        ),
        None => None,
    };
    let model = assemble_with(&records, verdict.as_ref(), options);
    let written = ReportExporter::new(&model)
        .export_all(out)
        .with_context(|| format!("failed to export report to {}", out.display()))?;
    println!("[report] wrote {} files to {}", written.len(), out.display());
    Ok(written)
}

pub fn run(args: ReportArgs) -> Result<ExitCode> {
    let options = ReportOptions {
        baseline: args.baseline,
        candidate: args.candidate,
    };
    render(&args.results, args.summary.as_deref(), &options, &args.out)?;
    Ok(ExitCode::SUCCESS)
}
