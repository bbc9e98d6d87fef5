//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph snapshots and traversal."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Structural defects in a dependency snapshot. No partial graph is usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedGraphError {
    #[error("service declaration {index} has an empty name")]
    EmptyServiceName { index: usize },
    #[error("service {0} is declared more than once")]
    DuplicateService(String),
    #[error("dependency {index} is missing its {field}")]
    IncompleteDependency { index: usize, field: &'static str },
    #[error("{referenced_by} references unknown service {service}")]
    UnknownService {
        service: String,
        referenced_by: String,
    },
    #[error("endpoint at position {index} has an empty name")]
    EmptyEndpointName { index: usize },
    #[error("endpoint {0} does not name a root service")]
    EmptyEntrypoint(String),
    #[error("service {service} declares {replicas} replicas; at least one is required")]
    InvalidReplicaCount { service: String, replicas: u32 },
    #[error("service {service} declares failure probability {value} outside [0, 1]")]
    InvalidFailureProbability { service: String, value: f64 },
    #[error("call {caller} -> {callee} closes a cycle")]
    Cycle { caller: String, callee: String },
    #[error("replica vector has {actual} entries for {expected} services")]
    ReplicaVectorMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed graph: {0}")]
    Malformed(#[from] MalformedGraphError),
    #[error("endpoint {0} not found in graph")]
    UnknownEndpoint(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
}
