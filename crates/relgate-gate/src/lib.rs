//! ---
//! rg_section: "09-gate"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Release gate evaluation and summaries."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Release gate: reduces a result set to a pass/fail verdict against a threshold.
//!
//! An empty selection is an error, never a pass.

pub mod config;
pub mod errors;
pub mod evaluator;
pub mod summary;

pub use config::GateConfig;
pub use errors::{GateError, Result};
pub use evaluator::{evaluate, GateVerdict, Score, Violation};
pub use summary::GateSummary;
