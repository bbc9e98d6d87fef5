//! ---
//! rg_section: "08-scenario"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Scenario runner and result-set persistence."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use rayon::prelude::*;
use relgate_common::FailurePrior;
use relgate_graph::DependencyGraph;
use relgate_logging::{log_stage_event, rg_info, LogContext, StageOutcome};
use relgate_metrics::ScenarioMetrics;
use relgate_sim::Simulator;
use relgate_topology::TopologyVariant;

use crate::errors::{Result, ScenarioError};
use crate::io::variant_key;
use crate::record::{ScenarioRun, SimulationUnit, VariantFailure};

/// Runs every (variant, prior) unit against one base graph.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    simulator: Simulator,
    metrics: Option<ScenarioMetrics>,
}

/// Run with the analytic estimator and no metrics.
pub fn run(
    base: &DependencyGraph,
    variants: &[TopologyVariant],
    priors: &[f64],
) -> Result<ScenarioRun> {
    ScenarioRunner::default().run(base, variants, priors)
}

impl ScenarioRunner {
    pub fn new(simulator: Simulator) -> Self {
        Self {
            simulator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ScenarioMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn simulator(&self) -> Simulator {
        self.simulator
    }

    /// Simulate every variant at every prior.
    ///
    /// Priors are validated before any work starts and duplicates collapse. A variant
    /// that cannot be applied to `base` is reported in [`ScenarioRun::failures`]
    /// while the remaining variants still run.
    pub fn run(
        &self,
        base: &DependencyGraph,
        variants: &[TopologyVariant],
        priors: &[f64],
    ) -> Result<ScenarioRun> {
        let priors = priors
            .iter()
            .map(|value| FailurePrior::new(*value))
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        // Names that differ only in case or unsafe characters would share result files.
        let mut seen = HashSet::new();
        if let Some(duplicate) = variants.iter().find(|v| !seen.insert(variant_key(&v.name))) {
            return Err(ScenarioError::DuplicateVariant(duplicate.name.clone()));
        }

        let mut failures = Vec::new();
        let mut applied = Vec::with_capacity(variants.len());
        for variant in variants {
            let context = LogContext::new()
                .with_variant(&variant.name)
                .with_stage("topology");
            match variant.apply(base) {
                Ok(graph) => applied.push((variant.name.as_str(), graph)),
                Err(err) => {
                    let reason = err.to_string();
                    log_stage_event(
                        Some(&context),
                        "variant_rejected",
                        &reason,
                        StageOutcome::Fault,
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_variant_failure(&variant.name);
                    }
                    failures.push(VariantFailure {
                        variant: variant.name.clone(),
                        reason,
                    });
                }
            }
        }

        let work = applied
            .iter()
            .flat_map(|(name, graph)| priors.iter().map(move |prior| (*name, graph, *prior)))
            .collect::<Vec<_>>();

        // Indexed parallel collect keeps the declared order.
        let units = work
            .par_iter()
            .map(|(variant, graph, prior)| -> Result<SimulationUnit> {
                let started = Instant::now();
                let outcome = self.simulator.simulate(graph, *prior, variant)?;
                if let Some(metrics) = &self.metrics {
                    metrics.record_unit(
                        variant,
                        outcome.endpoints.len(),
                        outcome.warnings.len(),
                        started.elapsed().as_secs_f64(),
                    );
                }
                Ok(SimulationUnit {
                    variant: (*variant).to_owned(),
                    outcome,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let run = ScenarioRun {
            units,
            failures,
            metadata: base.metadata().clone(),
        };
        rg_info!(
            context = LogContext::new().with_stage("scenario"),
            "scenario run finished: {} variants, {} priors, {} units, {} failed variants",
            variants.len(),
            priors.len(),
            run.units.len(),
            run.failures.len()
        );
        Ok(run)
    }
}
