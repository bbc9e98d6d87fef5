//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph snapshots and traversal."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Dependency graph model: services, call edges, and entry endpoints, validated
//! once at load time and immutable afterwards.

pub mod errors;
pub mod io;
mod loader;
pub mod model;
pub mod source;

pub use errors::{GraphError, MalformedGraphError, Result};
pub use io::load_graph_from_file;
pub use model::{BrokenEdge, CallEdge, DependencyGraph, Endpoint, NodeView, ServiceNode};
pub use petgraph::graph::NodeIndex;
pub use relgate_common::CyclePolicy;
pub use source::{DependencyLink, EntrypointDecl, GraphDocument, ServiceDecl};
