//! ---
//! rg_section: "01-core-functionality"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Shared primitives and utilities for the reliability gate."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;
use crate::prior::FailurePrior;

fn default_graph_path() -> PathBuf {
    PathBuf::from("deps.json")
}

fn default_priors() -> Vec<f64> {
    vec![0.01, 0.05, 0.1]
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("target/results")
}

fn default_trials() -> u64 {
    10_000
}

fn default_seed() -> u64 {
    0xA11CEu64
}

fn default_threshold() -> f64 {
    0.95
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("target/results/gate-summary.json")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("target/report")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_textfile() -> PathBuf {
    PathBuf::from("target/metrics/relgate.prom")
}

/// Primary configuration object for a full simulate → gate → report run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub gate: DecisionConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "RELGATE_CONFIG";

    /// Load configuration from disk, respecting the `RELGATE_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let mut config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Rebase relative input and output paths onto the directory holding the config file.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        rebase(&mut self.scenario.graph);
        if let Some(topology) = self.scenario.topology.as_mut() {
            rebase(topology);
        }
        self.scenario.replica_files.iter_mut().for_each(rebase);
        rebase(&mut self.scenario.results_dir);
        rebase(&mut self.gate.summary);
        rebase(&mut self.report.output_dir);
        rebase(&mut self.logging.directory);
        rebase(&mut self.metrics.textfile);
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.scenario.validate()?;
        self.simulation.validate()?;
        self.gate.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// How cycles in a dependency snapshot are handled when building the DAG view.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Drop back edges found by a deterministic depth-first walk.
    #[default]
    Break,
    /// Refuse the snapshot.
    Reject,
}

impl std::str::FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "break" => Ok(CyclePolicy::Break),
            "reject" => Ok(CyclePolicy::Reject),
            other => Err(format!("unknown cycle policy: {}", other)),
        }
    }
}

/// Inputs for the scenario runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_graph_path")]
    pub graph: PathBuf,
    /// Topology document declaring named variants.
    #[serde(default)]
    pub topology: Option<PathBuf>,
    /// Flat `service: replicas` files, one variant per file.
    #[serde(default)]
    pub replica_files: Vec<PathBuf>,
    #[serde(default = "default_priors")]
    pub priors: Vec<f64>,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default)]
    pub cycles: CyclePolicy,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            graph: default_graph_path(),
            topology: None,
            replica_files: Vec::new(),
            priors: default_priors(),
            results_dir: default_results_dir(),
            cycles: CyclePolicy::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if self.priors.is_empty() {
            return Err(anyhow!("scenario must declare at least one failure prior"));
        }
        for prior in &self.priors {
            FailurePrior::new(*prior).map_err(|err| anyhow!("scenario.priors: {}", err))?;
        }
        Ok(())
    }

    /// Validated, de-duplicated priors in ascending order.
    pub fn failure_priors(&self) -> Result<Vec<FailurePrior>> {
        let mut priors = self
            .priors
            .iter()
            .map(|p| FailurePrior::new(*p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        priors.sort();
        priors.dedup();
        Ok(priors)
    }
}

/// Reliability estimation strategy.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Estimator {
    #[default]
    Analytic,
    MonteCarlo,
}

impl Estimator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estimator::Analytic => "analytic",
            Estimator::MonteCarlo => "monte-carlo",
        }
    }
}

impl std::fmt::Display for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Estimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "analytic" => Ok(Estimator::Analytic),
            "monte-carlo" | "montecarlo" | "mc" => Ok(Estimator::MonteCarlo),
            other => Err(format!("unknown estimator: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub estimator: Estimator,
    #[serde(default = "default_trials")]
    pub trials: u64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            estimator: Estimator::default(),
            trials: default_trials(),
            seed: default_seed(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.estimator, Estimator::MonteCarlo) && self.trials == 0 {
            return Err(anyhow!("monte-carlo estimation requires a positive trial count"));
        }
        Ok(())
    }
}

/// Gate decision mode.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    /// Fail when any selected endpoint falls below the threshold at any prior.
    #[default]
    Any,
    /// Fail when the averaged reliability falls below the threshold.
    Mean,
}

impl DecisionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionMode::Any => "any",
            DecisionMode::Mean => "mean",
        }
    }
}

impl std::fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DecisionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(DecisionMode::Any),
            "mean" => Ok(DecisionMode::Mean),
            other => Err(format!("unknown gate mode: {}", other)),
        }
    }
}

/// Decision configuration handed to the gate evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub mode: DecisionMode,
    #[serde(default)]
    pub filters: Vec<String>,
    /// Release variant to judge; `None` judges every variant in the result set.
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default = "default_summary_path")]
    pub summary: PathBuf,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            mode: DecisionMode::default(),
            filters: Vec::new(),
            variant: None,
            summary: default_summary_path(),
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(anyhow!(
                "gate.threshold {} is outside [0, 1]",
                self.threshold
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default)]
    pub candidate: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_report_dir(),
            baseline: None,
            candidate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_textfile")]
    pub textfile: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            textfile: default_metrics_textfile(),
        }
    }
}
