//! ---
//! rg_section: "09-gate"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Release gate evaluation and summaries."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use relgate_common::DecisionMode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GateConfig;
use crate::errors::Result;
use crate::evaluator::{GateVerdict, Score, Violation};

/// Persisted gate artifact consumed by the report stage and CI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSummary {
    pub threshold: f64,
    pub mode: DecisionMode,
    #[serde(rename = "results_mode", alias = "variant", default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    pub passed: bool,
    pub reason: String,
    #[serde(default)]
    pub aggregate: Option<f64>,
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, Vec<Score>>,
}

impl GateSummary {
    pub fn from_verdict(verdict: &GateVerdict, config: &GateConfig) -> Self {
        Self {
            threshold: verdict.threshold,
            mode: verdict.mode,
            variant: verdict.variant.clone(),
            filters: config.filters.iter().cloned().collect(),
            passed: verdict.passed,
            reason: verdict.reason.clone(),
            aggregate: Some(verdict.aggregate),
            violations: verdict.violations.clone(),
            endpoints: verdict.scores.clone(),
        }
    }

    /// Failing summary for a gate that could not be evaluated.
    pub fn from_error(config: &GateConfig, error: &dyn std::error::Error) -> Self {
        Self {
            threshold: config.threshold,
            mode: config.mode,
            variant: config.variant.clone(),
            filters: config.filters.iter().cloned().collect(),
            passed: false,
            reason: error.to_string(),
            aggregate: None,
            violations: Vec::new(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed {
            0
        } else {
            1
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        fs::write(path, body)?;
        info!(path = %path.display(), passed = self.passed, "gate summary written");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
