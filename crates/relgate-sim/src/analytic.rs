//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Exact series/parallel reliability.
//!
//! A node with `r` replicas and per-replica failure probability `p` is available
//! with probability `1 - p^r`. A node succeeds when it and every node in its
//! fatal-reachable closure are available. Each closure member is one independent
//! component, so a service reached along two paths is counted once; on trees this
//! reduces to the product of callee successes. An endpoint declared as a path needs
//! the union of its members' closures.

use std::collections::BTreeSet;

use relgate_common::{Estimator, FailurePrior};
use relgate_graph::DependencyGraph;

use crate::numeric::{clamp_probability, NumericRangeWarning};
use crate::outcome::{assemble, Estimate, NodeTables, SimulationOutcome};

/// Probability that at least one of `replicas` independent replicas is up.
pub fn replica_availability(failure_probability: f64, replicas: u32) -> f64 {
    1.0 - failure_probability.powf(f64::from(replicas))
}

/// Own availability of every node, indexed by node index.
pub(crate) fn availabilities(
    graph: &DependencyGraph,
    prior: FailurePrior,
    warnings: &mut Vec<NumericRangeWarning>,
) -> Vec<f64> {
    graph
        .services()
        .map(|node| {
            let p = graph.failure_probability(node.index(), prior.value());
            let value = replica_availability(p, node.replicas());
            clamp_probability(
                value,
                || format!("availability of {}", node.name()),
                warnings,
            )
        })
        .collect()
}

pub fn estimate(graph: &DependencyGraph, prior: FailurePrior) -> SimulationOutcome {
    let mut warnings = Vec::new();
    let availability = availabilities(graph, prior, &mut warnings);

    let mut closures: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); graph.service_count()];
    let mut success = vec![0.0; graph.service_count()];
    for &index in graph.dependency_order() {
        let mut closure = BTreeSet::from([index.index()]);
        for (callee, edge) in graph.calls(index) {
            if edge.fatal {
                closure.extend(closures[callee.index()].iter().copied());
            }
        }
        let value: f64 = closure.iter().map(|member| availability[*member]).product();
        success[index.index()] = clamp_probability(
            value,
            || format!("success of {}", graph.name_of(index)),
            &mut warnings,
        );
        closures[index.index()] = closure;
    }

    let endpoints = graph
        .endpoints()
        .map(|endpoint| {
            let mut members = BTreeSet::new();
            for root in graph.endpoint_members(endpoint) {
                members.extend(closures[root.index()].iter().copied());
            }
            let value: f64 = members.iter().map(|member| availability[*member]).product();
            let probability = clamp_probability(
                value,
                || format!("reliability of {}", endpoint.name),
                &mut warnings,
            );
            (probability, Estimate::Exact)
        })
        .collect();

    let tables = NodeTables {
        availability,
        success,
        endpoints,
    };
    assemble(graph, prior, Estimator::Analytic, tables, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior(value: f64) -> FailurePrior {
        FailurePrior::new(value).unwrap()
    }

    #[test]
    fn availability_is_monotone_in_replicas() {
        for p in [0.0, 0.01, 0.3, 0.9, 1.0] {
            let mut previous = replica_availability(p, 1);
            for r in 2..8 {
                let next = replica_availability(p, r);
                assert!(next >= previous, "p={p} r={r}");
                previous = next;
            }
        }
    }

    #[test]
    fn shared_dependency_counts_once() {
        let graph: DependencyGraph = r#"[
            {"parent": "a", "child": "b"},
            {"parent": "a", "child": "c"},
            {"parent": "b", "child": "d"},
            {"parent": "c", "child": "d"}
        ]"#
        .parse()
        .unwrap();
        let outcome = estimate(&graph, prior(0.1));
        let a = outcome.endpoint("/a").unwrap().probability;
        assert!((a - 0.9f64.powi(4)).abs() < 1e-12);
    }

    #[test]
    fn non_fatal_calls_do_not_multiply_in() {
        let graph: DependencyGraph = r#"[
            {"parent": "a", "child": "b", "fatal": false}
        ]"#
        .parse()
        .unwrap();
        let outcome = estimate(&graph, prior(0.2));
        assert!((outcome.endpoint("/a").unwrap().probability - 0.8).abs() < 1e-12);
    }
}
