//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use relgate_graph::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("monte carlo estimation requires at least one trial")]
    InvalidTrialCount,
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}
