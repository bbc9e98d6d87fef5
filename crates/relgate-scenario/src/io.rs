//! ---
//! rg_section: "08-scenario"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Scenario runner and result-set persistence."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Result-set directory: one `<variant>-pfail-<prior>.json` document per unit.
//!
//! Documents carry a `summary` block (`pfail`, `mode`, `timestamp`, min/max
//! reliability, entrypoint count, estimator), the per-service success table and the
//! per-endpoint reliabilities. JSON files without `summary.pfail` are skipped when
//! loading.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use relgate_common::{Estimator, FailurePrior};
use relgate_sim::{Estimate, NumericRangeWarning, ServiceAvailability};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::{Result, ScenarioError};
use crate::record::{ResultRecord, ScenarioRun, SimulationUnit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub pfail: f64,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas_file: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub min_reliability: f64,
    #[serde(default)]
    pub max_reliability: f64,
    #[serde(default)]
    pub entrypoint_count: usize,
    #[serde(default)]
    pub estimator: Estimator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointResult {
    pub reliability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Services on the endpoint's path, callees before callers.
    #[serde(default)]
    pub services: Vec<String>,
    /// Own availability of each service on the path.
    #[serde(default)]
    pub service_reliability: BTreeMap<String, f64>,
    #[serde(default)]
    pub replicas: BTreeMap<String, u32>,
    #[serde(default = "exact_estimate")]
    pub estimate: Estimate,
}

fn exact_estimate() -> Estimate {
    Estimate::Exact
}

/// On-disk form of one [`SimulationUnit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub summary: ResultSummary,
    /// Success probability of every service.
    #[serde(default)]
    pub service_reliability: BTreeMap<String, f64>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NumericRangeWarning>,
}

impl ResultFile {
    pub fn from_unit(unit: &SimulationUnit, metadata: &Map<String, Value>) -> Self {
        let outcome = &unit.outcome;
        let endpoints = outcome
            .endpoints
            .iter()
            .map(|endpoint| {
                let result = EndpointResult {
                    reliability: endpoint.probability,
                    root: Some(endpoint.root.clone()),
                    services: endpoint.services.iter().map(|s| s.service.clone()).collect(),
                    service_reliability: endpoint
                        .services
                        .iter()
                        .map(|s| (s.service.clone(), s.availability))
                        .collect(),
                    replicas: endpoint
                        .services
                        .iter()
                        .map(|s| (s.service.clone(), s.replicas))
                        .collect(),
                    estimate: endpoint.estimate,
                };
                (endpoint.endpoint.clone(), result)
            })
            .collect();

        ResultFile {
            metadata: metadata.clone(),
            summary: ResultSummary {
                pfail: outcome.prior.value(),
                mode: Some(unit.variant.clone()),
                replicas_file: None,
                timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                min_reliability: outcome.min_probability().unwrap_or(1.0),
                max_reliability: outcome.max_probability().unwrap_or(1.0),
                entrypoint_count: outcome.endpoints.len(),
                estimator: outcome.estimator,
            },
            service_reliability: outcome.services.clone(),
            endpoints,
            warnings: outcome.warnings.clone(),
        }
    }

    /// Every stored probability must lie in [0, 1].
    fn validate(&self, path: &Path) -> Result<()> {
        let services = self
            .service_reliability
            .iter()
            .map(|(service, value)| (format!("service_reliability.{}", service), *value));
        let endpoints = self.endpoints.iter().flat_map(|(name, result)| {
            std::iter::once((format!("endpoints.{}.reliability", name), result.reliability)).chain(
                result.service_reliability.iter().map(move |(service, value)| {
                    (
                        format!("endpoints.{}.service_reliability.{}", name, service),
                        *value,
                    )
                }),
            )
        });
        for (field, value) in services.chain(endpoints) {
            if value.is_nan() || !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::InvalidResultFile {
                    path: path.to_path_buf(),
                    reason: format!("{} = {} is outside [0, 1]", field, value),
                });
            }
        }
        Ok(())
    }

    /// Flatten back into records, endpoints in name order.
    pub fn records(&self, variant: &str, path: &Path) -> Result<Vec<ResultRecord>> {
        let prior = FailurePrior::new(self.summary.pfail).map_err(|err| {
            ScenarioError::InvalidResultFile {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        self.validate(path)?;
        Ok(self
            .endpoints
            .iter()
            .map(|(name, result)| {
                let services = result
                    .services
                    .iter()
                    .map(|service| {
                        let availability =
                            result.service_reliability.get(service).copied().unwrap_or(1.0);
                        ServiceAvailability {
                            service: service.clone(),
                            replicas: result.replicas.get(service).copied().unwrap_or(1),
                            availability,
                            success: self
                                .service_reliability
                                .get(service)
                                .copied()
                                .unwrap_or(availability),
                        }
                    })
                    .collect();
                ResultRecord {
                    variant: variant.to_owned(),
                    prior,
                    endpoint: name.clone(),
                    probability: result.reliability,
                    estimate: result.estimate,
                    root: result
                        .root
                        .clone()
                        .or_else(|| result.services.first().cloned())
                        .unwrap_or_else(|| name.trim_start_matches('/').to_owned()),
                    services,
                }
            })
            .collect())
    }
}

/// Identity of a variant across the result set: trimmed, lowercased, with characters
/// outside `[a-z0-9._-]` replaced by `_`. Two variants with the same key would share
/// result files.
pub fn variant_key(variant: &str) -> String {
    variant
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name for one unit, built from [`variant_key`].
pub fn result_file_name(variant: &str, prior: FailurePrior) -> String {
    format!("{}-pfail-{}.json", variant_key(variant), prior)
}

/// Write one document per unit into `dir`, creating it when missing.
pub fn write_results(dir: impl AsRef<Path>, run: &ScenarioRun) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(run.units.len());
    let mut claimed = HashSet::new();
    for unit in &run.units {
        let path = dir.join(result_file_name(&unit.variant, unit.prior()));
        if !claimed.insert(path.clone()) {
            return Err(ScenarioError::DuplicateResult {
                variant: unit.variant.clone(),
                prior: unit.prior().value(),
                path,
            });
        }
        let document = ResultFile::from_unit(unit, &run.metadata);
        let mut body = serde_json::to_string_pretty(&document)?;
        body.push('\n');
        fs::write(&path, body)?;
        debug!(
            path = %path.display(),
            variant = %unit.variant,
            prior = unit.prior().value(),
            "result file written"
        );
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "result set written");
    Ok(written)
}

/// Read every result document in `dir`, ordered by variant, prior, then endpoint.
///
/// The variant is the lowercased `summary.mode`, falling back to the stem of
/// `summary.replicas_file` and then to the file stem.
pub fn load_results(dir: impl AsRef<Path>) -> Result<Vec<ResultRecord>> {
    let dir = dir.as_ref();
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.retain(|path| path.extension().is_some_and(|ext| ext == "json") && path.is_file());
    paths.sort();

    let mut seen = BTreeSet::new();
    let mut records = Vec::new();
    for path in paths {
        let value: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        let has_prior = value
            .get("summary")
            .and_then(|summary| summary.get("pfail"))
            .is_some();
        if !has_prior {
            debug!(path = %path.display(), "skipping file without summary.pfail");
            continue;
        }
        let document: ResultFile =
            serde_json::from_value(value).map_err(|err| ScenarioError::InvalidResultFile {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        let variant = variant_name(&document.summary, &path);
        let unit_records = document.records(&variant, &path)?;
        let prior = FailurePrior::new(document.summary.pfail)?;
        if !seen.insert((variant.clone(), prior)) {
            return Err(ScenarioError::DuplicateResult {
                variant,
                prior: prior.value(),
                path,
            });
        }
        records.extend(unit_records);
    }

    records.sort_by(|a, b| {
        a.variant
            .cmp(&b.variant)
            .then_with(|| a.prior.cmp(&b.prior))
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });
    info!(dir = %dir.display(), records = records.len(), "result set loaded");
    Ok(records)
}

fn variant_name(summary: &ResultSummary, path: &Path) -> String {
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
    };
    summary
        .mode
        .as_deref()
        .map(str::trim)
        .filter(|mode| !mode.is_empty())
        .map(str::to_owned)
        .or_else(|| summary.replicas_file.as_deref().and_then(|f| stem(Path::new(f))))
        .or_else(|| stem(path))
        .unwrap_or_default()
        .to_lowercase()
}
