//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::BTreeMap;

use relgate_common::{Estimator, FailurePrior};
use relgate_graph::DependencyGraph;
use serde::{Deserialize, Serialize};

use crate::numeric::NumericRangeWarning;

/// How an endpoint probability was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimate {
    Exact,
    Sampled {
        trials: u64,
        successes: u64,
        std_error: f64,
    },
}

/// One service on an endpoint's dependency path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAvailability {
    pub service: String,
    pub replicas: u32,
    /// Probability that at least one replica is up.
    pub availability: f64,
    /// Probability that the service and everything it fatally depends on is up.
    pub success: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointEstimate {
    pub endpoint: String,
    pub root: String,
    pub probability: f64,
    pub estimate: Estimate,
    /// Services reachable from the root and any declared path members, callees
    /// before callers.
    pub services: Vec<ServiceAvailability>,
}

/// Result of simulating one graph under one prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub prior: FailurePrior,
    pub estimator: Estimator,
    /// Success probability of every service, reachable from an endpoint or not.
    pub services: BTreeMap<String, f64>,
    /// Endpoints in name order.
    pub endpoints: Vec<EndpointEstimate>,
    pub warnings: Vec<NumericRangeWarning>,
}

impl SimulationOutcome {
    pub fn endpoint(&self, name: &str) -> Option<&EndpointEstimate> {
        self.endpoints.iter().find(|e| e.endpoint == name)
    }

    pub fn min_probability(&self) -> Option<f64> {
        self.endpoints.iter().map(|e| e.probability).reduce(f64::min)
    }

    pub fn max_probability(&self) -> Option<f64> {
        self.endpoints.iter().map(|e| e.probability).reduce(f64::max)
    }
}

/// Per-node tables shared by both engines, indexed by node index, plus one value
/// per endpoint in [`DependencyGraph::endpoints`] order.
pub(crate) struct NodeTables {
    pub availability: Vec<f64>,
    pub success: Vec<f64>,
    pub endpoints: Vec<(f64, Estimate)>,
}

pub(crate) fn assemble(
    graph: &DependencyGraph,
    prior: FailurePrior,
    estimator: Estimator,
    tables: NodeTables,
    warnings: Vec<NumericRangeWarning>,
) -> SimulationOutcome {
    let services = graph
        .services()
        .map(|node| {
            (
                node.name().to_owned(),
                tables.success[node.index().index()],
            )
        })
        .collect();

    let endpoints = graph
        .endpoints()
        .zip(tables.endpoints)
        .map(|(endpoint, (probability, estimate))| {
            let members = graph.endpoint_members(endpoint);
            let path = graph
                .reachable_from_nodes(&members)
                .into_iter()
                .map(|node| ServiceAvailability {
                    service: node.name().to_owned(),
                    replicas: node.replicas(),
                    availability: tables.availability[node.index().index()],
                    success: tables.success[node.index().index()],
                })
                .collect();
            EndpointEstimate {
                endpoint: endpoint.name.clone(),
                root: endpoint.root.clone(),
                probability,
                estimate,
                services: path,
            }
        })
        .collect();

    SimulationOutcome {
        prior,
        estimator,
        services,
        endpoints,
        warnings,
    }
}
