//! ---
//! rg_section: "06-topology"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Replica topology variants and their application."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::HashSet;

use indexmap::IndexMap;
use relgate_graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, TopologyError};

/// Starting point for a variant's replica counts before overrides apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaBase {
    /// Keep the counts declared by the base graph.
    #[default]
    Inherit,
    /// Reset every service to a single replica.
    Single,
}

/// Named transformation of a base graph's replica counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyVariant {
    pub name: String,
    #[serde(default)]
    pub base: ReplicaBase,
    #[serde(default)]
    pub replicas: IndexMap<String, u32>,
}

impl TopologyVariant {
    /// Every service runs a single replica.
    pub fn no_replicas(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: ReplicaBase::Single,
            replicas: IndexMap::new(),
        }
    }

    /// Keep the base graph's counts; overrides can be layered with [`Self::with_replicas`].
    pub fn inherit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: ReplicaBase::Inherit,
            replicas: IndexMap::new(),
        }
    }

    pub fn with_replicas(mut self, service: impl Into<String>, replicas: u32) -> Self {
        self.replicas.insert(service.into(), replicas);
        self
    }

    /// Validate the declaration on its own, independent of any graph.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TopologyError::EmptyVariantName);
        }
        if let Some((service, replicas)) = self.replicas.iter().find(|(_, r)| **r == 0) {
            return Err(TopologyError::InvalidReplicaCount {
                variant: self.name.clone(),
                service: service.clone(),
                replicas: *replicas,
            });
        }
        Ok(())
    }

    /// Apply this variant to `base`. See [`apply`].
    pub fn apply(&self, base: &DependencyGraph) -> Result<DependencyGraph> {
        apply(base, self)
    }
}

/// Return a graph with replica counts overridden per `variant`.
///
/// Services the variant does not mention keep the base graph's count (or 1 for the
/// [`ReplicaBase::Single`] base). `base` is left untouched.
pub fn apply(base: &DependencyGraph, variant: &TopologyVariant) -> Result<DependencyGraph> {
    variant.validate()?;

    let mut counts = match variant.base {
        ReplicaBase::Inherit => base.replica_counts().to_vec(),
        ReplicaBase::Single => vec![1; base.service_count()],
    };
    for (service, replicas) in &variant.replicas {
        let index = base
            .index_of(service)
            .ok_or_else(|| TopologyError::UnknownService {
                variant: variant.name.clone(),
                service: service.clone(),
            })?;
        counts[index.index()] = *replicas;
    }

    let derived = base.with_replica_counts(counts)?;
    debug!(
        variant = %variant.name,
        base = ?variant.base,
        overrides = variant.replicas.len(),
        "topology variant applied"
    );
    Ok(derived)
}

/// A topology document declaring an ordered list of named variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyDocument {
    #[serde(default)]
    pub variants: Vec<TopologyVariant>,
}

impl TopologyDocument {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for variant in &self.variants {
            variant.validate()?;
            if !seen.insert(variant.name.as_str()) {
                return Err(TopologyError::DuplicateVariant(variant.name.clone()));
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for TopologyDocument {
    type Err = TopologyError;

    fn from_str(data: &str) -> std::result::Result<Self, Self::Err> {
        let document: TopologyDocument = serde_yaml::from_str(data)?;
        document.validate()?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        r#"{
            "services": [{"name": "a"}, {"name": "b", "replicas": 2}, {"name": "c"}],
            "dependencies": [{"parent": "a", "child": "b"}, {"parent": "b", "child": "c"}],
            "entrypoints": {"/a": "a"}
        }"#
        .parse()
        .unwrap()
    }

    #[test]
    fn overrides_apply_and_base_is_untouched() {
        let base = chain();
        let variant = TopologyVariant::inherit("repl").with_replicas("c", 3);
        let derived = apply(&base, &variant).unwrap();

        assert_eq!(derived.replica_count("a"), Some(1));
        assert_eq!(derived.replica_count("b"), Some(2));
        assert_eq!(derived.replica_count("c"), Some(3));
        assert_eq!(base.replica_count("c"), Some(1));
        assert!(derived.shares_structure_with(&base));
    }

    #[test]
    fn single_base_resets_declared_counts() {
        let derived = TopologyVariant::no_replicas("norepl")
            .apply(&chain())
            .unwrap();
        assert!(derived.replica_counts().iter().all(|r| *r == 1));
    }

    #[test]
    fn unknown_service_is_rejected() {
        let variant = TopologyVariant::inherit("repl").with_replicas("ghost", 2);
        let err = apply(&chain(), &variant).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnknownService { ref variant, ref service }
                if variant == "repl" && service == "ghost"
        ));
    }

    #[test]
    fn zero_replicas_are_rejected() {
        let variant = TopologyVariant::inherit("broken").with_replicas("a", 0);
        assert!(matches!(
            apply(&chain(), &variant),
            Err(TopologyError::InvalidReplicaCount { .. })
        ));
    }

    #[test]
    fn document_parses_and_rejects_duplicates() {
        let document: TopologyDocument = r#"
variants:
  - name: norepl
    base: single
  - name: repl
    replicas:
      b: 4
"#
        .parse()
        .unwrap();
        assert_eq!(document.variants.len(), 2);
        assert_eq!(document.variants[0].base, ReplicaBase::Single);
        assert_eq!(document.variants[1].replicas["b"], 4);

        let duplicate = "variants:\n  - name: x\n  - name: x\n".parse::<TopologyDocument>();
        assert!(matches!(duplicate, Err(TopologyError::DuplicateVariant(name)) if name == "x"));
    }
}
