//! ---
//! rg_section: "01-core-functionality"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Shared primitives and utilities for the reliability gate."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Core shared primitives for the relgate workspace.
//! This crate exposes configuration loading, tracing initialisation, and the
//! validated failure prior consumed across the simulation pipeline.

pub mod config;
pub mod logging;
pub mod prior;

pub use config::{
    AppConfig, CyclePolicy, DecisionConfig, DecisionMode, Estimator, LoadedAppConfig,
    LoggingConfig, MetricsConfig, ReportConfig, ScenarioConfig, SimulationConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use prior::{FailurePrior, InvalidPrior};
