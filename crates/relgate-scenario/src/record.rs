//! ---
//! rg_section: "08-scenario"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Scenario runner and result-set persistence."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use relgate_common::FailurePrior;
use relgate_sim::{Estimate, ServiceAvailability, SimulationOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Success probability of one endpoint under one (variant, prior) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub variant: String,
    pub prior: FailurePrior,
    pub endpoint: String,
    pub probability: f64,
    pub estimate: Estimate,
    pub root: String,
    #[serde(default)]
    pub services: Vec<ServiceAvailability>,
}

/// Full simulation outcome for one (variant, prior) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationUnit {
    pub variant: String,
    pub outcome: SimulationOutcome,
}

impl SimulationUnit {
    pub fn prior(&self) -> FailurePrior {
        self.outcome.prior
    }

    pub fn records(&self) -> impl Iterator<Item = ResultRecord> + '_ {
        self.outcome.endpoints.iter().map(|endpoint| ResultRecord {
            variant: self.variant.clone(),
            prior: self.outcome.prior,
            endpoint: endpoint.endpoint.clone(),
            probability: endpoint.probability,
            estimate: endpoint.estimate,
            root: endpoint.root.clone(),
            services: endpoint.services.clone(),
        })
    }
}

/// A topology variant that could not be applied to the base graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub variant: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioRun {
    /// Units ordered by declared variant, then ascending prior.
    pub units: Vec<SimulationUnit>,
    pub failures: Vec<VariantFailure>,
    /// Metadata carried over from the graph snapshot.
    pub metadata: Map<String, Value>,
}

impl ScenarioRun {
    /// Records ordered by variant (declaration order), prior, then endpoint name.
    pub fn records(&self) -> Vec<ResultRecord> {
        self.units.iter().flat_map(SimulationUnit::records).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.units.iter().map(|u| u.outcome.warnings.len()).sum()
    }
}
