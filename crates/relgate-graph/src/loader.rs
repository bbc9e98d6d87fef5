//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph snapshots and traversal."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Validation and DAG construction for declarative snapshots.
//!
//! Everything that can be wrong with a snapshot is rejected here, before any
//! simulation starts. Construction is deterministic: services are indexed in name
//! order and the cycle-breaking walk visits roots and callees in name order, so the
//! same snapshot always yields the same DAG view.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use relgate_common::CyclePolicy;
use tracing::{debug, warn};

use crate::errors::{MalformedGraphError, Result};
use crate::model::{BrokenEdge, CallEdge, DependencyGraph, Endpoint, GraphStructure, ServiceNode};
use crate::source::GraphDocument;

#[derive(Debug, Default)]
struct ServiceSpec {
    replicas: u32,
    failure_probability: Option<f64>,
}

impl DependencyGraph {
    /// Validate a parsed snapshot and build its DAG view.
    pub fn from_document(document: GraphDocument, cycles: CyclePolicy) -> Result<Self> {
        let strict = !document.services.is_empty();
        let mut services = collect_declared_services(&document)?;
        let edges = collect_edges(&document, &mut services, strict)?;
        let endpoints = collect_endpoints(&document, &services, &edges)?;

        // BTreeMap iteration gives name-ordered node indices.
        let mut dag = DiGraph::<ServiceNode, CallEdge>::with_capacity(services.len(), edges.len());
        let mut index = HashMap::with_capacity(services.len());
        let mut replicas = Vec::with_capacity(services.len());
        for (name, spec) in &services {
            let node = dag.add_node(ServiceNode {
                name: name.clone(),
                failure_probability: spec.failure_probability,
            });
            index.insert(name.clone(), node);
            replicas.push(spec.replicas);
        }

        // petgraph yields neighbours most-recent first; inserting each caller's
        // callees in descending name order makes traversals visit them ascending.
        let mut ordered_edges = edges.into_iter().collect::<Vec<_>>();
        ordered_edges.sort_by(|((a_caller, a_callee), _), ((b_caller, b_callee), _)| {
            a_caller.cmp(b_caller).then_with(|| b_callee.cmp(a_callee))
        });
        for ((caller, callee), edge) in ordered_edges {
            dag.add_edge(index[&caller], index[&callee], edge);
        }

        let mut starts = endpoints
            .values()
            .map(|endpoint| index[&endpoint.root])
            .collect::<Vec<_>>();
        starts.extend(dag.node_indices());

        let mut back_edges = Vec::new();
        depth_first_search(&dag, starts, |event| {
            if let DfsEvent::BackEdge(caller, callee) = event {
                back_edges.push((caller, callee));
            }
        });

        let mut broken_edges = Vec::with_capacity(back_edges.len());
        if !back_edges.is_empty() {
            let (caller, callee) = back_edges[0];
            if matches!(cycles, CyclePolicy::Reject) {
                return Err(MalformedGraphError::Cycle {
                    caller: dag[caller].name.clone(),
                    callee: dag[callee].name.clone(),
                }
                .into());
            }
            let dropped: HashSet<(NodeIndex, NodeIndex)> = back_edges.iter().copied().collect();
            for (caller, callee) in &back_edges {
                warn!(
                    caller = %dag[*caller].name,
                    callee = %dag[*callee].name,
                    "breaking dependency cycle by dropping call"
                );
                broken_edges.push(BrokenEdge {
                    caller: dag[*caller].name.clone(),
                    callee: dag[*callee].name.clone(),
                });
            }
            dag = dag.filter_map(
                |_, node| Some(node.clone()),
                |edge, weight| {
                    let keep = dag
                        .edge_endpoints(edge)
                        .map_or(true, |pair| !dropped.contains(&pair));
                    keep.then_some(*weight)
                },
            );
        }

        let mut dependency_order = toposort(&dag, None).map_err(|cycle| {
            let node = cycle.node_id();
            MalformedGraphError::Cycle {
                caller: dag[node].name.clone(),
                callee: dag[node].name.clone(),
            }
        })?;
        dependency_order.reverse();

        debug!(
            services = dag.node_count(),
            calls = dag.edge_count(),
            endpoints = endpoints.len(),
            broken = broken_edges.len(),
            "dependency graph loaded"
        );

        let structure = GraphStructure {
            dag,
            index,
            endpoints,
            broken_edges,
            dependency_order,
            metadata: document.metadata,
        };
        Ok(DependencyGraph::from_structure(structure, replicas))
    }
}

fn collect_declared_services(
    document: &GraphDocument,
) -> std::result::Result<BTreeMap<String, ServiceSpec>, MalformedGraphError> {
    let mut services = BTreeMap::new();
    for (position, decl) in document.services.iter().enumerate() {
        let name = decl.name.trim();
        if name.is_empty() {
            return Err(MalformedGraphError::EmptyServiceName { index: position });
        }
        let replicas = decl.replicas.unwrap_or(1);
        if replicas == 0 {
            return Err(MalformedGraphError::InvalidReplicaCount {
                service: name.to_owned(),
                replicas,
            });
        }
        if let Some(value) = decl.failure_probability {
            if value.is_nan() || !(0.0..=1.0).contains(&value) {
                return Err(MalformedGraphError::InvalidFailureProbability {
                    service: name.to_owned(),
                    value,
                });
            }
        }
        let spec = ServiceSpec {
            replicas,
            failure_probability: decl.failure_probability,
        };
        if services.insert(name.to_owned(), spec).is_some() {
            return Err(MalformedGraphError::DuplicateService(name.to_owned()));
        }
    }
    Ok(services)
}

/// Merge links into unique caller → callee edges. With an explicit service list every
/// link must reference a declared service; otherwise services are implied by links.
fn collect_edges(
    document: &GraphDocument,
    services: &mut BTreeMap<String, ServiceSpec>,
    strict: bool,
) -> std::result::Result<IndexMap<(String, String), CallEdge>, MalformedGraphError> {
    let mut edges: IndexMap<(String, String), CallEdge> = IndexMap::new();
    for (position, link) in document.dependencies.iter().enumerate() {
        let parent = required_field(link.parent.as_deref(), position, "parent")?;
        let child = required_field(link.child.as_deref(), position, "child")?;

        for service in [parent, child] {
            if services.contains_key(service) {
                continue;
            }
            if strict {
                return Err(MalformedGraphError::UnknownService {
                    service: service.to_owned(),
                    referenced_by: format!("call {} -> {}", parent, child),
                });
            }
            services.insert(
                service.to_owned(),
                ServiceSpec {
                    replicas: 1,
                    failure_probability: None,
                },
            );
        }

        let key = (parent.to_owned(), child.to_owned());
        match edges.get_mut(&key) {
            Some(existing) => {
                existing.fatal |= link.fatal;
                existing.call_count = match (existing.call_count, link.call_count) {
                    (Some(a), Some(b)) => Some(a.saturating_add(b)),
                    (a, b) => a.or(b),
                };
            }
            None => {
                edges.insert(
                    key,
                    CallEdge {
                        fatal: link.fatal,
                        call_count: link.call_count,
                    },
                );
            }
        }
    }
    Ok(edges)
}

fn required_field<'a>(
    value: Option<&'a str>,
    index: usize,
    field: &'static str,
) -> std::result::Result<&'a str, MalformedGraphError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(MalformedGraphError::IncompleteDependency { index, field })
}

fn collect_endpoints(
    document: &GraphDocument,
    services: &BTreeMap<String, ServiceSpec>,
    edges: &IndexMap<(String, String), CallEdge>,
) -> std::result::Result<BTreeMap<String, Endpoint>, MalformedGraphError> {
    let mut endpoints = BTreeMap::new();

    if document.entrypoints.is_empty() {
        // Without declared entrypoints every caller is exposed as `/<caller>`.
        let callers = edges
            .keys()
            .map(|(caller, _)| caller.as_str())
            .collect::<BTreeSet<_>>();
        for caller in callers {
            let name = format!("/{}", caller);
            endpoints.insert(
                name.clone(),
                Endpoint {
                    name,
                    root: caller.to_owned(),
                    declared_path: Vec::new(),
                },
            );
        }
        return Ok(endpoints);
    }

    for (position, (name, decl)) in document.entrypoints.iter().enumerate() {
        let name = name.trim();
        if name.is_empty() {
            return Err(MalformedGraphError::EmptyEndpointName { index: position });
        }
        let root = decl
            .root()
            .ok_or_else(|| MalformedGraphError::EmptyEntrypoint(name.to_owned()))?;
        let mut declared_path = Vec::with_capacity(decl.declared_path().len());
        for service in std::iter::once(root).chain(decl.declared_path().iter().map(|s| s.trim())) {
            if !services.contains_key(service) {
                return Err(MalformedGraphError::UnknownService {
                    service: service.to_owned(),
                    referenced_by: format!("endpoint {}", name),
                });
            }
            if service != root {
                declared_path.push(service.to_owned());
            }
        }
        endpoints.insert(
            name.to_owned(),
            Endpoint {
                name: name.to_owned(),
                root: root.to_owned(),
                declared_path,
            },
        );
    }
    Ok(endpoints)
}
