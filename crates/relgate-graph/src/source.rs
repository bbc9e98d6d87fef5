//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph snapshots and traversal."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Declarative snapshot formats accepted by the graph loader.
//!
//! Two shapes are understood: a bare array of Jaeger dependency links, and a
//! document carrying `dependencies`, optional `entrypoints` and `services`, plus
//! arbitrary metadata keys that are preserved verbatim.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{GraphError, Result};

fn default_fatal() -> bool {
    true
}

/// One caller → callee link as exported by Jaeger's `/api/dependencies`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyLink {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub child: Option<String>,
    #[serde(default, rename = "callCount", alias = "call_count")]
    pub call_count: Option<u64>,
    /// Whether the caller fails when the callee fails.
    #[serde(default = "default_fatal")]
    pub fatal: bool,
}

/// Explicit service declaration with optional overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default)]
    pub replicas: Option<u32>,
    #[serde(default, alias = "pfail")]
    pub failure_probability: Option<f64>,
}

/// An endpoint's root, either as a bare name, a service path whose first
/// element is the root, or `{ root = "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EntrypointDecl {
    Root(String),
    Path(Vec<String>),
    Detailed { root: String },
}

impl EntrypointDecl {
    pub fn root(&self) -> Option<&str> {
        let root = match self {
            EntrypointDecl::Root(root) | EntrypointDecl::Detailed { root } => Some(root.as_str()),
            EntrypointDecl::Path(path) => path.first().map(String::as_str),
        };
        root.map(str::trim).filter(|root| !root.is_empty())
    }

    /// Services listed after the root in the path form.
    pub fn declared_path(&self) -> &[String] {
        match self {
            EntrypointDecl::Path(path) if !path.is_empty() => &path[1..],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphDocument {
    #[serde(default)]
    pub dependencies: Vec<DependencyLink>,
    #[serde(default)]
    pub entrypoints: IndexMap<String, EntrypointDecl>,
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawGraph {
    Links(Vec<DependencyLink>),
    Document(GraphDocument),
}

impl From<RawGraph> for GraphDocument {
    fn from(raw: RawGraph) -> Self {
        match raw {
            RawGraph::Links(dependencies) => GraphDocument {
                dependencies,
                ..GraphDocument::default()
            },
            RawGraph::Document(document) => document,
        }
    }
}

impl GraphDocument {
    /// Parse a snapshot, treating documents that open with `{` or `[` as JSON and
    /// everything else as YAML.
    pub fn parse(data: &str) -> Result<Self> {
        let trimmed = data.trim_start();
        let raw: RawGraph = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            serde_json::from_str(data)?
        } else {
            serde_yaml::from_str(data).map_err(GraphError::YamlSerializationFailed)?
        };
        Ok(raw.into())
    }
}
