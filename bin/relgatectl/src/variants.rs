//! ---
//! rg_section: "11-cli"
//! rg_subsection: "binary"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Control CLI for simulating, gating and reporting releases."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relgate_topology::{load_replica_file, load_topology_file, TopologyVariant};

/// Variants from a topology document followed by one per replica file. Without either,
/// compare a single-replica deployment against the snapshot's declared counts.
pub fn collect(topology: Option<&Path>, replica_files: &[PathBuf]) -> Result<Vec<TopologyVariant>> {
    let mut variants = Vec::new();
    if let Some(path) = topology {
        let document = load_topology_file(path)
            .with_context(|| format!("failed to load topology {}", path.display()))?;
        variants.extend(document.variants);
    }
    for path in replica_files {
        let variant = load_replica_file(path)
            .with_context(|| format!("failed to load replica file {}", path.display()))?;
        variants.push(variant);
    }
    if variants.is_empty() {
        variants.push(TopologyVariant::no_replicas("norepl"));
        variants.push(TopologyVariant::inherit("repl"));
    }
    Ok(variants)
}
