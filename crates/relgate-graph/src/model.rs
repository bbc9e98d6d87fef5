//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph snapshots and traversal."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsPostOrder, EdgeRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{GraphError, MalformedGraphError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceNode {
    pub name: String,
    /// Intrinsic per-call failure probability; the scenario prior applies when unset.
    #[serde(default)]
    pub failure_probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEdge {
    pub fatal: bool,
    #[serde(default)]
    pub call_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub root: String,
    /// Services named after the root in a path-style entrypoint declaration.
    #[serde(default)]
    pub declared_path: Vec<String>,
}

/// A call dropped while building the DAG view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrokenEdge {
    pub caller: String,
    pub callee: String,
}

/// Immutable structure shared by every replica-count variant of one snapshot.
#[derive(Debug)]
pub(crate) struct GraphStructure {
    pub(crate) dag: DiGraph<ServiceNode, CallEdge>,
    pub(crate) index: HashMap<String, NodeIndex>,
    pub(crate) endpoints: BTreeMap<String, Endpoint>,
    pub(crate) broken_edges: Vec<BrokenEdge>,
    /// Every node, callees before callers.
    pub(crate) dependency_order: Vec<NodeIndex>,
    pub(crate) metadata: Map<String, Value>,
}

/// Validated dependency snapshot: a DAG of services plus per-service replica counts.
///
/// Cloning is cheap. Only the replica counts differ between topology variants, so the
/// structure is shared and the count vector is replaced on write.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub(crate) structure: Arc<GraphStructure>,
    pub(crate) replicas: Arc<Vec<u32>>,
}

/// Borrowed view over one service in a [`DependencyGraph`].
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    graph: &'a DependencyGraph,
    index: NodeIndex,
}

impl<'a> NodeView<'a> {
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn name(&self) -> &'a str {
        &self.graph.structure.dag[self.index].name
    }

    pub fn replicas(&self) -> u32 {
        self.graph.replicas[self.index.index()]
    }

    pub fn failure_override(&self) -> Option<f64> {
        self.graph.structure.dag[self.index].failure_probability
    }

    /// Outbound calls ordered by callee name.
    pub fn callees(&self) -> Vec<(&'a str, CallEdge)> {
        let mut callees = self
            .graph
            .calls(self.index)
            .map(|(callee, edge)| (self.graph.structure.dag[callee].name.as_str(), edge))
            .collect::<Vec<_>>();
        callees.sort_by(|a, b| a.0.cmp(b.0));
        callees
    }
}

impl DependencyGraph {
    pub(crate) fn from_structure(structure: GraphStructure, replicas: Vec<u32>) -> Self {
        Self {
            structure: Arc::new(structure),
            replicas: Arc::new(replicas),
        }
    }

    pub fn service_count(&self) -> usize {
        self.structure.dag.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.structure.dag.edge_count()
    }

    /// Services in name order.
    pub fn services(&self) -> impl Iterator<Item = NodeView<'_>> + '_ {
        self.structure
            .dag
            .node_indices()
            .map(move |index| NodeView { graph: self, index })
    }

    pub fn node(&self, name: &str) -> Option<NodeView<'_>> {
        self.index_of(name).map(|index| NodeView { graph: self, index })
    }

    pub fn node_at(&self, index: NodeIndex) -> NodeView<'_> {
        NodeView { graph: self, index }
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.structure.index.get(name).copied()
    }

    pub fn contains_service(&self, name: &str) -> bool {
        self.structure.index.contains_key(name)
    }

    pub fn name_of(&self, index: NodeIndex) -> &str {
        &self.structure.dag[index].name
    }

    /// Outbound calls of `index` in the DAG view.
    pub fn calls(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, CallEdge)> + '_ {
        self.structure
            .dag
            .edges(index)
            .map(|edge| (edge.target(), *edge.weight()))
    }

    pub fn replicas(&self, index: NodeIndex) -> u32 {
        self.replicas[index.index()]
    }

    pub fn replica_count(&self, name: &str) -> Option<u32> {
        self.index_of(name).map(|index| self.replicas(index))
    }

    /// Replica counts indexed by node index.
    pub fn replica_counts(&self) -> &[u32] {
        &self.replicas
    }

    /// Failure probability of one replica of `index` under the given prior.
    pub fn failure_probability(&self, index: NodeIndex, prior: f64) -> f64 {
        self.structure.dag[index]
            .failure_probability
            .unwrap_or(prior)
    }

    /// Build a sibling graph sharing this structure with new replica counts.
    pub fn with_replica_counts(
        &self,
        counts: Vec<u32>,
    ) -> std::result::Result<Self, MalformedGraphError> {
        if counts.len() != self.service_count() {
            return Err(MalformedGraphError::ReplicaVectorMismatch {
                expected: self.service_count(),
                actual: counts.len(),
            });
        }
        if let Some((position, replicas)) = counts.iter().enumerate().find(|(_, r)| **r == 0) {
            return Err(MalformedGraphError::InvalidReplicaCount {
                service: self.name_of(NodeIndex::new(position)).to_owned(),
                replicas: *replicas,
            });
        }
        Ok(Self {
            structure: Arc::clone(&self.structure),
            replicas: Arc::new(counts),
        })
    }

    /// Whether both graphs were derived from the same loaded snapshot.
    pub fn shares_structure_with(&self, other: &DependencyGraph) -> bool {
        Arc::ptr_eq(&self.structure, &other.structure)
    }

    /// Endpoints in name order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> + '_ {
        self.structure.endpoints.values()
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.structure.endpoints.get(name)
    }

    pub fn endpoint_root(&self, name: &str) -> Result<NodeIndex> {
        let endpoint = self
            .endpoint(name)
            .ok_or_else(|| GraphError::UnknownEndpoint(name.to_owned()))?;
        // Roots were resolved at load time.
        self.index_of(&endpoint.root)
            .ok_or_else(|| GraphError::UnknownEndpoint(name.to_owned()))
    }

    /// Calls dropped to turn the snapshot into a DAG.
    pub fn broken_edges(&self) -> &[BrokenEdge] {
        &self.structure.broken_edges
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.structure.metadata
    }

    /// Every node in dependency order (callees before callers).
    pub fn dependency_order(&self) -> &[NodeIndex] {
        &self.structure.dependency_order
    }

    /// Nodes reachable from the endpoint's root, callees before callers, root last.
    pub fn reachable_from(&self, endpoint: &str) -> Result<Vec<NodeView<'_>>> {
        let declared = self
            .endpoint(endpoint)
            .ok_or_else(|| GraphError::UnknownEndpoint(endpoint.to_owned()))?;
        Ok(self.reachable_from_nodes(&self.endpoint_members(declared)))
    }

    /// The root followed by each service of a path-style declaration, once each.
    /// The endpoint succeeds only when every member succeeds.
    pub fn endpoint_members(&self, endpoint: &Endpoint) -> Vec<NodeIndex> {
        let mut members = Vec::with_capacity(1 + endpoint.declared_path.len());
        for name in std::iter::once(&endpoint.root).chain(&endpoint.declared_path) {
            if let Some(index) = self.index_of(name) {
                if !members.contains(&index) {
                    members.push(index);
                }
            }
        }
        members
    }

    /// Union of the nodes reachable from `roots`, callees before callers.
    pub fn reachable_from_nodes(&self, roots: &[NodeIndex]) -> Vec<NodeView<'_>> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for root in roots {
            for node in self.reachable_from_node(*root) {
                if seen.insert(node.index) {
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    pub fn reachable_from_node(&self, root: NodeIndex) -> Vec<NodeView<'_>> {
        let mut dfs = DfsPostOrder::new(&self.structure.dag, root);
        let mut nodes = Vec::new();
        while let Some(index) = dfs.next(&self.structure.dag) {
            nodes.push(NodeView { graph: self, index });
        }
        nodes
    }
}
