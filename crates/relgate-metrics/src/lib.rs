//! ---
//! rg_section: "03-logging"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Metrics collection and export utilities."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::info;

/// Shared registry type used across crates.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Render every metric family in the Prometheus text exposition format.
pub fn encode_text(registry: &SharedRegistry) -> Result<String> {
    let families = registry.gather();
    TextEncoder::new()
        .encode_to_string(&families)
        .context("failed to encode metrics")
}

/// Write the registry to a node-exporter style text file.
pub fn write_textfile(registry: &SharedRegistry, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create metrics directory {}", parent.display()))?;
    }
    let body = encode_text(registry)?;
    fs::write(path, body)
        .with_context(|| format!("unable to write metrics file {}", path.display()))?;
    info!(path = %path.display(), "metrics text file written");
    Ok(())
}

/// Metrics recorded by the command-line pipeline itself.
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: SharedRegistry,
    stage_runs_total: IntCounterVec,
    gate_verdicts_total: IntCounterVec,
    config_load_seconds: Histogram,
}

impl PipelineMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let stage_runs_total = IntCounterVec::new(
            Opts::new(
                "relgate_stage_runs_total",
                "Number of pipeline stages executed by outcome",
            ),
            &["stage", "outcome"],
        )?;
        registry.register(Box::new(stage_runs_total.clone()))?;

        let gate_verdicts_total = IntCounterVec::new(
            Opts::new(
                "relgate_gate_verdicts_total",
                "Gate verdicts emitted by decision mode and result",
            ),
            &["mode", "result"],
        )?;
        registry.register(Box::new(gate_verdicts_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.0001, 2.0, 16)
            .context("failed to construct histogram buckets")?;
        let config_load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "relgate_config_load_seconds",
                "Time spent loading and validating configuration",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(config_load_seconds.clone()))?;

        Ok(Self {
            registry,
            stage_runs_total,
            gate_verdicts_total,
            config_load_seconds,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn record_stage(&self, stage: &str, success: bool) {
        let outcome = if success { "success" } else { "fault" };
        self.stage_runs_total
            .with_label_values(&[stage, outcome])
            .inc();
    }

    pub fn record_verdict(&self, mode: &str, passed: bool) {
        let result = if passed { "pass" } else { "fail" };
        self.gate_verdicts_total
            .with_label_values(&[mode, result])
            .inc();
    }

    pub fn observe_config_load(&self, seconds: f64) {
        self.config_load_seconds.observe(seconds);
    }
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}

/// Metrics recorded by the scenario runner.
#[derive(Clone)]
pub struct ScenarioMetrics {
    records_total: IntCounterVec,
    variant_failures_total: IntCounterVec,
    numeric_warnings_total: IntCounterVec,
    unit_seconds: Histogram,
}

impl ScenarioMetrics {
    pub fn new(registry: &SharedRegistry) -> Result<Self> {
        let records_total = IntCounterVec::new(
            Opts::new(
                "relgate_scenario_records_total",
                "Result records produced per topology variant",
            ),
            &["variant"],
        )?;
        registry.register(Box::new(records_total.clone()))?;

        let variant_failures_total = IntCounterVec::new(
            Opts::new(
                "relgate_scenario_variant_failures_total",
                "Topology variants that could not be applied",
            ),
            &["variant"],
        )?;
        registry.register(Box::new(variant_failures_total.clone()))?;

        let numeric_warnings_total = IntCounterVec::new(
            Opts::new(
                "relgate_numeric_range_warnings_total",
                "Probabilities clamped into [0, 1] during simulation",
            ),
            &["variant"],
        )?;
        registry.register(Box::new(numeric_warnings_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.00005, 2.0, 20)
            .context("failed to construct histogram buckets")?;
        let unit_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "relgate_scenario_unit_seconds",
                "Wall time of one (variant, prior) simulation unit",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(unit_seconds.clone()))?;

        Ok(Self {
            records_total,
            variant_failures_total,
            numeric_warnings_total,
            unit_seconds,
        })
    }

    pub fn record_unit(&self, variant: &str, records: usize, warnings: usize, seconds: f64) {
        self.records_total
            .with_label_values(&[variant])
            .inc_by(records as u64);
        if warnings > 0 {
            self.numeric_warnings_total
                .with_label_values(&[variant])
                .inc_by(warnings as u64);
        }
        self.unit_seconds.observe(seconds);
    }

    pub fn record_variant_failure(&self, variant: &str) {
        self.variant_failures_total
            .with_label_values(&[variant])
            .inc();
    }
}

impl std::fmt::Debug for ScenarioMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioMetrics").finish_non_exhaustive()
    }
}
