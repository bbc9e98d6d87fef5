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
use clap::{Args, ValueEnum};
use relgate_common::{CyclePolicy, Estimator, SimulationConfig};
use relgate_graph::load_graph_from_file;
use relgate_metrics::{new_registry, write_textfile, ScenarioMetrics};
use relgate_scenario::{write_results, ScenarioRun, ScenarioRunner};
use relgate_sim::Simulator;
use relgate_topology::TopologyVariant;
use tracing::warn;

use crate::{exit_code, variants};

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Dependency snapshot (Jaeger link array, or JSON/YAML document).
    #[arg(long, value_name = "FILE")]
    graph: PathBuf,

    /// Flat `service: count` replica file; repeat for several variants.
    #[arg(long = "replicas", value_name = "FILE", num_args = 1..)]
    replicas: Vec<PathBuf>,

    /// Topology document declaring named variants.
    #[arg(long, value_name = "FILE")]
    topology: Option<PathBuf>,

    /// Failure priors to simulate.
    #[arg(long, value_name = "P", required = true, num_args = 1..)]
    pfail: Vec<f64>,

    /// Directory receiving one result document per (variant, prior).
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = EstimatorArg::Analytic)]
    estimator: EstimatorArg,

    /// Trials per unit for the Monte Carlo estimator.
    #[arg(long, default_value_t = 10_000)]
    trials: u64,

    /// Base seed for the Monte Carlo estimator.
    #[arg(long, default_value_t = 0xA11CE)]
    seed: u64,

    /// How dependency cycles are handled.
    #[arg(long, value_enum, default_value_t = CycleArg::Break)]
    cycles: CycleArg,

    /// Write Prometheus metrics for this run to a text file.
    #[arg(long = "metrics-out", value_name = "FILE")]
    metrics_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EstimatorArg {
    Analytic,
    MonteCarlo,
}

impl From<EstimatorArg> for Estimator {
    fn from(value: EstimatorArg) -> Self {
        match value {
            EstimatorArg::Analytic => Estimator::Analytic,
            EstimatorArg::MonteCarlo => Estimator::MonteCarlo,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CycleArg {
    Break,
    Reject,
}

impl From<CycleArg> for CyclePolicy {
    fn from(value: CycleArg) -> Self {
        match value {
            CycleArg::Break => CyclePolicy::Break,
            CycleArg::Reject => CyclePolicy::Reject,
        }
    }
}

/// Inputs for one scenario run, shared by `simulate` and `run`.
pub struct ScenarioInputs<'a> {
    pub graph: &'a Path,
    pub cycles: CyclePolicy,
    pub variants: Vec<TopologyVariant>,
    pub priors: &'a [f64],
    pub simulation: &'a SimulationConfig,
    pub results_dir: &'a Path,
}

/// Load the snapshot, run every unit and persist the result set.
pub fn execute(inputs: ScenarioInputs<'_>, metrics: Option<ScenarioMetrics>) -> Result<ScenarioRun> {
    let graph = load_graph_from_file(inputs.graph, inputs.cycles)
        .with_context(|| format!("failed to load graph {}", inputs.graph.display()))?;
    let simulator = Simulator::from_config(inputs.simulation)?;
    let mut runner = ScenarioRunner::new(simulator);
    if let Some(metrics) = metrics {
        runner = runner.with_metrics(metrics);
    }
    let run = runner.run(&graph, &inputs.variants, inputs.priors)?;
    for failure in &run.failures {
        warn!(variant = %failure.variant, reason = %failure.reason, "variant skipped");
        eprintln!("[simulate] variant {} skipped: {}", failure.variant, failure.reason);
    }
    let written = write_results(inputs.results_dir, &run).with_context(|| {
        format!(
            "failed to write results to {}",
            inputs.results_dir.display()
        )
    })?;
    println!(
        "[simulate] wrote {} result files to {}",
        written.len(),
        inputs.results_dir.display()
    );
    Ok(run)
}

pub fn run(args: SimulateArgs) -> Result<ExitCode> {
    let simulation = SimulationConfig {
        estimator: args.estimator.into(),
        trials: args.trials,
        seed: args.seed,
    };
    simulation.validate()?;
    let variants = variants::collect(args.topology.as_deref(), &args.replicas)?;

    let registry = new_registry();
    let metrics = args
        .metrics_out
        .as_ref()
        .map(|_| ScenarioMetrics::new(&registry))
        .transpose()?;

    let inputs = ScenarioInputs {
        graph: &args.graph,
        cycles: args.cycles.into(),
        variants,
        priors: &args.pfail,
        simulation: &simulation,
        results_dir: &args.out,
    };
    let run = execute(inputs, metrics)?;

    if let Some(path) = &args.metrics_out {
        write_textfile(&registry, path)?;
    }
    Ok(exit_code(run.is_complete()))
}
