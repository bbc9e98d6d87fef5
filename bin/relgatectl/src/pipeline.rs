//! ---
//! rg_section: "11-cli"
//! rg_subsection: "binary"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Control CLI for simulating, gating and reporting releases."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use relgate_common::{init_tracing, AppConfig};
use relgate_gate::GateConfig;
use relgate_metrics::{new_registry, write_textfile, PipelineMetrics, ScenarioMetrics};
use relgate_report::ReportOptions;
use tracing::info;

use crate::simulate::ScenarioInputs;
use crate::{exit_code, gate, report, simulate, variants};

const DEFAULT_CONFIG_CANDIDATES: [&str; 2] = ["relgate.toml", "config/relgate.toml"];

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Configuration file; falls back to RELGATE_CONFIG, then ./relgate.toml and
    /// ./config/relgate.toml.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> Result<ExitCode> {
    let candidates = match args.config {
        Some(path) => vec![path],
        None => DEFAULT_CONFIG_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    let started = Instant::now();
    let loaded = AppConfig::load_with_source(&candidates)?;
    let config_seconds = started.elapsed().as_secs_f64();
    let config = loaded.config;

    init_tracing("relgatectl", &config.logging)
        .context("failed to initialise logging")?;
    info!(config = %loaded.source.display(), "configuration loaded");

    let registry = new_registry();
    let metrics = PipelineMetrics::new(registry.clone())?;
    metrics.observe_config_load(config_seconds);
    let scenario_metrics = ScenarioMetrics::new(&registry)?;

    let variants = variants::collect(
        config.scenario.topology.as_deref(),
        &config.scenario.replica_files,
    );
    let simulated = variants.and_then(|variants| {
        simulate::execute(
            ScenarioInputs {
                graph: &config.scenario.graph,
                cycles: config.scenario.cycles,
                variants,
                priors: &config.scenario.priors,
                simulation: &config.simulation,
                results_dir: &config.scenario.results_dir,
            },
            Some(scenario_metrics),
        )
    });
    metrics.record_stage("simulate", simulated.is_ok());
    let run = simulated?;

    let gate_config = GateConfig::from(&config.gate);
    let judged = gate::judge(
        &config.scenario.results_dir,
        &gate_config,
        Some(config.gate.summary.as_path()),
    );
    metrics.record_stage("gate", judged.is_ok());
    let summary = judged?;
    metrics.record_verdict(summary.mode.as_str(), summary.passed);

    let options = ReportOptions {
        baseline: config.report.baseline.clone(),
        candidate: config.report.candidate.clone(),
    };
    let reported = report::render(
        &config.scenario.results_dir,
        Some(config.gate.summary.as_path()),
        &options,
        &config.report.output_dir,
    );
    metrics.record_stage("report", reported.is_ok());
    reported?;

    if config.metrics.enabled {
        write_textfile(&registry, &config.metrics.textfile)?;
    }

    info!(
        passed = summary.passed,
        complete = run.is_complete(),
        "pipeline finished"
    );
    Ok(exit_code(summary.passed && run.is_complete()))
}
