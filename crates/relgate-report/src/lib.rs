//! ---
//! rg_section: "10-report"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Report model assembly and export."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Report assembler: turns a result set and gate summary into a renderer-neutral
//! data model, plus JSON and CSV exporters.

pub mod errors;
pub mod export;
pub mod model;

pub use errors::{ReportError, Result};
pub use export::ReportExporter;
pub use model::{assemble, assemble_with, Comparison, ReportModel, ReportOptions, ReportPoint};
