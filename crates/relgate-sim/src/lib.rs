//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Reliability simulator: per-node and per-endpoint success probabilities for one
//! graph under one failure prior.
//!
//! Two engines share one outcome type. The analytic engine is exact and the default;
//! the Monte Carlo engine samples replica failures and is reproducible for a seed.

pub mod analytic;
pub mod errors;
pub mod monte_carlo;
pub mod numeric;
pub mod outcome;
pub mod seed;
pub mod simulator;

pub use errors::{Result, SimError};
pub use monte_carlo::MonteCarloConfig;
pub use numeric::{clamp_probability, NumericRangeWarning};
pub use outcome::{Estimate, EndpointEstimate, ServiceAvailability, SimulationOutcome};
pub use simulator::Simulator;
