//! ---
//! rg_section: "06-topology"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Replica topology variants and their application."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::{fs, path::Path};

use indexmap::IndexMap;
use tracing::info;

use crate::errors::{Result, TopologyError};
use crate::variant::{ReplicaBase, TopologyDocument, TopologyVariant};

/// Load a flat `service: count` replica file as an inheriting variant named after the
/// lowercased file stem (`norepl.yaml` becomes `norepl`).
pub fn load_replica_file(path: impl AsRef<Path>) -> Result<TopologyVariant> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .filter(|stem| !stem.is_empty())
        .ok_or(TopologyError::EmptyVariantName)?;
    let data = fs::read_to_string(path)?;
    let variant = TopologyVariant::from_replica_yaml(name, &data)?;
    info!(
        path = %path.display(),
        variant = %variant.name,
        overrides = variant.replicas.len(),
        "replica file loaded"
    );
    Ok(variant)
}

/// Load a topology document with a `variants:` list.
pub fn load_topology_file(path: impl AsRef<Path>) -> Result<TopologyDocument> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let document: TopologyDocument = data.parse()?;
    info!(
        path = %path.display(),
        variants = document.variants.len(),
        "topology document loaded"
    );
    Ok(document)
}

impl TopologyVariant {
    /// Parse a flat `service: count` mapping. Blank or comment-only input yields a
    /// variant without overrides.
    pub fn from_replica_yaml(name: impl Into<String>, data: &str) -> Result<Self> {
        let blank = data
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#'));
        let replicas: Option<IndexMap<String, u32>> = if blank {
            None
        } else {
            serde_yaml::from_str(data)?
        };
        let variant = TopologyVariant {
            name: name.into(),
            base: ReplicaBase::Inherit,
            replicas: replicas.unwrap_or_default(),
        };
        variant.validate()?;
        Ok(variant)
    }
}
