//! ---
//! rg_section: "03-logging"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Structured logging adapters and sinks."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Context-enriched logging helpers shared by the simulation pipeline.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber writing to stderr, suitable for CLI use.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Topology variant being simulated or judged.
    pub variant: Option<&'a str>,
    /// Failure prior of the current unit of work.
    pub prior: Option<f64>,
    /// Entry endpoint associated with the log event.
    pub endpoint: Option<&'a str>,
    /// Pipeline stage (load, simulate, gate, report).
    pub stage: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a topology variant name.
    pub fn with_variant(mut self, variant: &'a str) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Attach a failure prior.
    pub fn with_prior(mut self, prior: f64) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Attach an endpoint name.
    pub fn with_endpoint(mut self, endpoint: &'a str) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Attach a pipeline stage descriptor.
    pub fn with_stage(mut self, stage: &'a str) -> Self {
        self.stage = Some(stage);
        self
    }
}

/// High-level outcome used when emitting pipeline stage events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage completed successfully.
    Success,
    /// The stage failed or was aborted.
    Fault,
}

impl StageOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Success => "success",
            StageOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized stage event with a success/fault outcome.
pub fn log_stage_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: StageOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    match outcome {
        StageOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            variant = ctx.variant.unwrap_or(""),
            prior = ctx.prior.unwrap_or(f64::NAN),
            endpoint = ctx.endpoint.unwrap_or(""),
            stage = ctx.stage.unwrap_or(""),
            message = %message
        ),
        StageOutcome::Fault => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            variant = ctx.variant.unwrap_or(""),
            prior = ctx.prior.unwrap_or(f64::NAN),
            endpoint = ctx.endpoint.unwrap_or(""),
            stage = ctx.stage.unwrap_or(""),
            message = %message
        ),
    }
}
