//! ---
//! rg_section: "08-scenario"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Scenario runner and result-set persistence."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Scenario runner: simulates every (topology variant, failure prior) unit over one
//! base graph and flattens the outcomes into result records.
//!
//! Result sets persist as one JSON document per unit so the gate and report stages
//! can run as separate processes.

pub mod errors;
pub mod io;
pub mod record;
pub mod runner;

pub use errors::{Result, ScenarioError};
pub use io::{load_results, result_file_name, variant_key, write_results, ResultFile};
pub use record::{ResultRecord, ScenarioRun, SimulationUnit, VariantFailure};
pub use runner::{run, ScenarioRunner};
