//! ---
//! rg_section: "06-topology"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Replica topology variants and their application."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Topology variants: named overrides of a snapshot's replica counts.
//!
//! The "no replicas" versus "replicas" comparison is two variants over one base
//! graph. Applying a variant never touches the base graph; the derived graph shares
//! its structure and carries its own replica-count vector.

pub mod errors;
pub mod io;
pub mod variant;

pub use errors::{Result, TopologyError};
pub use io::{load_replica_file, load_topology_file};
pub use variant::{apply, ReplicaBase, TopologyDocument, TopologyVariant};
