//! ---
//! rg_section: "10-report"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Report model assembly and export."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::errors::Result;
use crate::model::ReportModel;

pub const REPORT_JSON: &str = "report.json";
pub const RELIABILITY_CSV: &str = "reliability.csv";
pub const COMPARISON_CSV: &str = "comparison.csv";

#[derive(Debug)]
pub struct ReportExporter<'a> {
    model: &'a ReportModel,
    generated_at: DateTime<Utc>,
}

impl<'a> ReportExporter<'a> {
    pub fn new(model: &'a ReportModel) -> Self {
        Self {
            model,
            generated_at: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Write `report.json`, `reliability.csv` and, when a comparison was made,
    /// `comparison.csv`. Returns the written paths.
    pub fn export_all(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let timestamp = self.generated_at.to_rfc3339();
        let envelope = ReportEnvelope::new(&timestamp, report_schema(), self.model);
        let mut written = vec![output_dir.join(REPORT_JSON)];
        write_json(&written[0], &envelope)?;

        let csv_path = output_dir.join(RELIABILITY_CSV);
        self.write_reliability_csv(&csv_path)?;
        written.push(csv_path);

        if !self.model.comparisons.is_empty() {
            let path = output_dir.join(COMPARISON_CSV);
            self.write_comparison_csv(&path)?;
            written.push(path);
        }

        info!("Reports exported to {}", output_dir.display());
        Ok(written)
    }

    fn write_reliability_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (endpoint, points) in &self.model.endpoints {
            for point in points {
                writer.serialize(ReliabilityRow {
                    endpoint,
                    variant: &point.variant,
                    pfail: point.prior.value(),
                    reliability: point.probability,
                })?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_comparison_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for comparison in &self.model.comparisons {
            writer.serialize(ComparisonRow {
                endpoint: &comparison.endpoint,
                pfail: comparison.prior.value(),
                baseline: comparison.baseline,
                candidate: comparison.candidate,
                uplift: comparison.uplift,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ReliabilityRow<'a> {
    endpoint: &'a str,
    variant: &'a str,
    pfail: f64,
    reliability: f64,
}

#[derive(Debug, Serialize)]
struct ComparisonRow<'a> {
    endpoint: &'a str,
    pfail: f64,
    baseline: Option<f64>,
    candidate: Option<f64>,
    uplift: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: &'a str,
    version: &'static str,
    schema: serde_json::Value,
    data: &'a T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    fn new(timestamp: &'a str, schema: serde_json::Value, data: &'a T) -> Self {
        Self {
            timestamp,
            version: env!("CARGO_PKG_VERSION"),
            schema,
            data,
        }
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let mut serialized = serde_json::to_string_pretty(value)?;
    serialized.push('\n');
    fs::write(path, serialized)?;
    Ok(())
}

fn report_schema() -> serde_json::Value {
    let prior = json!({"type": "number", "minimum": 0, "maximum": 1});
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ReliabilityReport",
        "type": "object",
        "properties": {
            "variants": {"type": "array", "items": {"type": "string"}},
            "priors": {"type": "array", "items": prior},
            "endpoints": {
                "type": "object",
                "additionalProperties": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "variant": {"type": "string"},
                            "prior": prior,
                            "probability": {"type": "number", "minimum": 0, "maximum": 1}
                        },
                        "required": ["variant", "prior", "probability"]
                    }
                }
            },
            "baseline": {"type": ["string", "null"]},
            "candidate": {"type": ["string", "null"]},
            "comparisons": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "endpoint": {"type": "string"},
                        "prior": prior,
                        "baseline": {"type": ["number", "null"]},
                        "candidate": {"type": ["number", "null"]},
                        "uplift": {"type": ["number", "null"]}
                    },
                    "required": ["endpoint", "prior"]
                }
            },
            "verdict": {
                "type": ["object", "null"],
                "properties": {
                    "passed": {"type": "boolean"},
                    "reason": {"type": "string"},
                    "threshold": {"type": "number"},
                    "mode": {"enum": ["any", "mean"]}
                },
                "required": ["passed", "reason", "threshold", "mode"]
            }
        },
        "required": ["variants", "priors", "endpoints", "comparisons"]
    })
}
