//! ---
//! rg_section: "08-scenario"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Scenario runner and result-set persistence."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::path::PathBuf;

use relgate_common::InvalidPrior;
use relgate_sim::SimError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    InvalidPrior(#[from] InvalidPrior),
    #[error("topology variant {0} is declared more than once")]
    DuplicateVariant(String),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimError),
    #[error("results for variant {variant} at pfail={prior} appear twice (second copy in {path})")]
    DuplicateResult {
        variant: String,
        prior: f64,
        path: PathBuf,
    },
    #[error("result file {path} is invalid: {reason}")]
    InvalidResultFile { path: PathBuf, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
