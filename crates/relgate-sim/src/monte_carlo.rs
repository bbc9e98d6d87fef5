//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Sampled reliability.
//!
//! Every trial draws an independent up/down state for each replica, marks a node up
//! when any replica is up, and propagates failure along fatal calls. Trials run in
//! fixed-size blocks, each with its own seeded generator, so the counts do not depend
//! on how rayon schedules the blocks. An endpoint trial succeeds when every member of
//! the endpoint is up in that trial.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use relgate_common::{Estimator, FailurePrior};
use relgate_graph::{DependencyGraph, NodeIndex};

use crate::analytic::availabilities;
use crate::errors::{Result, SimError};
use crate::numeric::clamp_probability;
use crate::outcome::{assemble, Estimate, NodeTables, SimulationOutcome};
use crate::seed::{block_seed, unit_seed};

pub const DEFAULT_BLOCK_SIZE: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloConfig {
    pub trials: u64,
    pub seed: u64,
    pub block_size: u64,
}

impl MonteCarloConfig {
    pub fn new(trials: u64, seed: u64) -> Result<Self> {
        if trials == 0 {
            return Err(SimError::InvalidTrialCount);
        }
        Ok(Self {
            trials,
            seed,
            block_size: DEFAULT_BLOCK_SIZE,
        })
    }

    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    fn block_count(&self) -> u64 {
        self.trials.div_ceil(self.block_size)
    }
}

/// Flattened view of the DAG for the sampling loop.
struct SamplingPlan {
    order: Vec<usize>,
    failure: Vec<f64>,
    replicas: Vec<u32>,
    fatal_callees: Vec<Vec<usize>>,
    /// Members of each endpoint, in [`DependencyGraph::endpoints`] order.
    endpoints: Vec<Vec<usize>>,
}

impl SamplingPlan {
    fn new(graph: &DependencyGraph, prior: FailurePrior) -> Self {
        let order = graph.dependency_order().iter().map(|i| i.index()).collect();
        let failure = graph
            .services()
            .map(|node| graph.failure_probability(node.index(), prior.value()))
            .collect();
        let fatal_callees = graph
            .services()
            .map(|node| {
                graph
                    .calls(node.index())
                    .filter(|(_, edge)| edge.fatal)
                    .map(|(callee, _)| callee.index())
                    .collect()
            })
            .collect();
        let endpoints = graph
            .endpoints()
            .map(|endpoint| {
                graph
                    .endpoint_members(endpoint)
                    .iter()
                    .map(|member| member.index())
                    .collect()
            })
            .collect();
        Self {
            order,
            failure,
            replicas: graph.replica_counts().to_vec(),
            fatal_callees,
            endpoints,
        }
    }

    fn counter_len(&self) -> usize {
        self.order.len() + self.endpoints.len()
    }

    /// Success counts for `trials` trials: one slot per node, then one per endpoint.
    fn run_block(&self, seed: u64, trials: u64) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = self.order.len();
        let mut counts = vec![0u64; self.counter_len()];
        let mut up = vec![false; nodes];
        for _ in 0..trials {
            for &node in &self.order {
                let p = self.failure[node];
                let available = (0..self.replicas[node]).any(|_| rng.gen::<f64>() >= p);
                let ok = available && self.fatal_callees[node].iter().all(|callee| up[*callee]);
                up[node] = ok;
                if ok {
                    counts[node] += 1;
                }
            }
            for (slot, members) in self.endpoints.iter().enumerate() {
                if members.iter().all(|member| up[*member]) {
                    counts[nodes + slot] += 1;
                }
            }
        }
        counts
    }
}

pub fn estimate(
    graph: &DependencyGraph,
    prior: FailurePrior,
    variant: &str,
    config: &MonteCarloConfig,
) -> Result<SimulationOutcome> {
    if config.trials == 0 {
        return Err(SimError::InvalidTrialCount);
    }
    let mut warnings = Vec::new();
    let availability = availabilities(graph, prior, &mut warnings);
    let plan = SamplingPlan::new(graph, prior);
    let seed = unit_seed(config.seed, variant, prior.value());

    let counts = (0..config.block_count())
        .into_par_iter()
        .map(|block| {
            let start = block * config.block_size;
            let trials = config.block_size.min(config.trials - start);
            plan.run_block(block_seed(seed, block), trials)
        })
        .reduce(
            || vec![0u64; plan.counter_len()],
            |mut total, block| {
                for (sum, count) in total.iter_mut().zip(block) {
                    *sum += count;
                }
                total
            },
        );

    let trials = config.trials as f64;
    let nodes = graph.service_count();
    let mut success = Vec::with_capacity(nodes);
    for (position, count) in counts[..nodes].iter().enumerate() {
        let value = *count as f64 / trials;
        let subject = || format!("sampled success of {}", graph.name_of(NodeIndex::new(position)));
        success.push(clamp_probability(value, subject, &mut warnings));
    }

    let mut endpoints = Vec::with_capacity(counts.len() - nodes);
    for (endpoint, successes) in graph.endpoints().zip(&counts[nodes..]) {
        let p = *successes as f64 / trials;
        let probability = clamp_probability(
            p,
            || format!("sampled reliability of {}", endpoint.name),
            &mut warnings,
        );
        let estimate = Estimate::Sampled {
            trials: config.trials,
            successes: *successes,
            std_error: (p * (1.0 - p) / trials).sqrt(),
        };
        endpoints.push((probability, estimate));
    }

    let tables = NodeTables {
        availability,
        success,
        endpoints,
    };
    Ok(assemble(graph, prior, Estimator::MonteCarlo, tables, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trials_are_rejected() {
        assert!(matches!(
            MonteCarloConfig::new(0, 1),
            Err(SimError::InvalidTrialCount)
        ));
    }

    #[test]
    fn blocks_cover_every_trial() {
        let config = MonteCarloConfig::new(2500, 1).unwrap().with_block_size(1000);
        assert_eq!(config.block_count(), 3);
        let config = MonteCarloConfig::new(2000, 1).unwrap().with_block_size(1000);
        assert_eq!(config.block_count(), 2);
    }

    #[test]
    fn block_size_does_not_change_trial_total() {
        let graph: DependencyGraph = r#"[{"parent": "a", "child": "b"}]"#.parse().unwrap();
        let prior = FailurePrior::new(0.3).unwrap();
        let config = MonteCarloConfig::new(777, 9).unwrap().with_block_size(100);
        let outcome = estimate(&graph, prior, "v", &config).unwrap();
        match outcome.endpoint("/a").unwrap().estimate {
            Estimate::Sampled { trials, successes, .. } => {
                assert_eq!(trials, 777);
                assert!(successes <= 777);
            }
            Estimate::Exact => panic!("expected sampled estimate"),
        }
    }
}
