//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph snapshots and traversal."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::{fs, path::Path};

use relgate_common::CyclePolicy;
use tracing::info;

use crate::{errors::Result, model::DependencyGraph, source::GraphDocument};

pub fn load_graph_from_file(path: impl AsRef<Path>, cycles: CyclePolicy) -> Result<DependencyGraph> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let graph = DependencyGraph::from_source(&data, cycles)?;
    info!(
        path = %path.display(),
        services = graph.service_count(),
        endpoints = graph.endpoints().count(),
        "dependency snapshot loaded"
    );
    Ok(graph)
}

impl DependencyGraph {
    /// Parse and validate a JSON or YAML snapshot.
    pub fn from_source(data: &str, cycles: CyclePolicy) -> Result<Self> {
        DependencyGraph::from_document(GraphDocument::parse(data)?, cycles)
    }
}

impl std::str::FromStr for DependencyGraph {
    type Err = crate::errors::GraphError;

    fn from_str(data: &str) -> std::result::Result<Self, Self::Err> {
        DependencyGraph::from_source(data, CyclePolicy::default())
    }
}
