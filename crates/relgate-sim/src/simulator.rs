//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use relgate_common::{Estimator, FailurePrior, SimulationConfig};
use relgate_graph::DependencyGraph;
use relgate_logging::{rg_debug, rg_warn, LogContext};

use crate::errors::Result;
use crate::monte_carlo::MonteCarloConfig;
use crate::outcome::SimulationOutcome;
use crate::{analytic, monte_carlo};

/// Selected reliability engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Simulator {
    #[default]
    Analytic,
    MonteCarlo(MonteCarloConfig),
}

impl Simulator {
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        Ok(match config.estimator {
            Estimator::Analytic => Simulator::Analytic,
            Estimator::MonteCarlo => {
                Simulator::MonteCarlo(MonteCarloConfig::new(config.trials, config.seed)?)
            }
        })
    }

    pub fn monte_carlo(trials: u64, seed: u64) -> Result<Self> {
        Ok(Simulator::MonteCarlo(MonteCarloConfig::new(trials, seed)?))
    }

    pub fn estimator(&self) -> Estimator {
        match self {
            Simulator::Analytic => Estimator::Analytic,
            Simulator::MonteCarlo(_) => Estimator::MonteCarlo,
        }
    }

    /// Estimate every node and endpoint of `graph` under `prior`. `variant` only feeds
    /// the sampling seed and log context.
    pub fn simulate(
        &self,
        graph: &DependencyGraph,
        prior: FailurePrior,
        variant: &str,
    ) -> Result<SimulationOutcome> {
        let outcome = match self {
            Simulator::Analytic => analytic::estimate(graph, prior),
            Simulator::MonteCarlo(config) => monte_carlo::estimate(graph, prior, variant, config)?,
        };

        let context = LogContext::new()
            .with_variant(variant)
            .with_prior(prior.value())
            .with_stage("simulate");
        if !outcome.warnings.is_empty() {
            rg_warn!(
                context = context,
                "{} probabilities clamped into [0, 1]",
                outcome.warnings.len()
            );
        }
        rg_debug!(
            context = context,
            "{} estimate over {} services, {} endpoints, min reliability {:.4}",
            self.estimator(),
            graph.service_count(),
            outcome.endpoints.len(),
            outcome.min_probability().unwrap_or(1.0)
        );
        Ok(outcome)
    }
}
