//! ---
//! rg_section: "09-gate"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Release gate evaluation and summaries."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GateError>;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("no results matched the filters{}", variant_suffix(.variant))]
    EmptyResultSet { variant: Option<String> },
    #[error("gate threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

fn variant_suffix(variant: &Option<String>) -> String {
    variant
        .as_deref()
        .map(|v| format!(" for variant '{}'", v))
        .unwrap_or_default()
}
