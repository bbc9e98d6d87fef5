//! ---
//! rg_section: "06-topology"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Replica topology variants and their application."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use relgate_graph::MalformedGraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopologyError>;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("variant {variant} names unknown service {service}")]
    UnknownService { variant: String, service: String },
    #[error("variant {variant} sets {replicas} replicas for {service}; at least one is required")]
    InvalidReplicaCount {
        variant: String,
        service: String,
        replicas: u32,
    },
    #[error("topology variant name must not be empty")]
    EmptyVariantName,
    #[error("topology declares variant {0} more than once")]
    DuplicateVariant(String),
    #[error("derived graph rejected: {0}")]
    Graph(#[from] MalformedGraphError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
}
