//! ---
//! rg_section: "10-report"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Report model assembly and export."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::{BTreeMap, BTreeSet};

use relgate_common::FailurePrior;
use relgate_gate::GateSummary;
use relgate_scenario::ResultRecord;
use serde::{Deserialize, Serialize};

/// Variant names compared by default when both are present.
const DEFAULT_BASELINE: &str = "norepl";
const DEFAULT_CANDIDATE: &str = "repl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPoint {
    pub variant: String,
    pub prior: FailurePrior,
    pub probability: f64,
}

/// Baseline against candidate for one (endpoint, prior) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub endpoint: String,
    pub prior: FailurePrior,
    pub baseline: Option<f64>,
    pub candidate: Option<f64>,
    /// `candidate - baseline` when both are present.
    pub uplift: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub baseline: Option<String>,
    pub candidate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportModel {
    /// Variants in order of first appearance in the result set.
    pub variants: Vec<String>,
    pub priors: Vec<FailurePrior>,
    /// Per endpoint, points ordered by variant then prior.
    pub endpoints: BTreeMap<String, Vec<ReportPoint>>,
    pub baseline: Option<String>,
    pub candidate: Option<String>,
    pub comparisons: Vec<Comparison>,
    pub verdict: Option<GateSummary>,
}

impl ReportModel {
    pub fn probability(&self, endpoint: &str, variant: &str, prior: FailurePrior) -> Option<f64> {
        self.endpoints
            .get(endpoint)?
            .iter()
            .find(|p| p.variant == variant && p.prior == prior)
            .map(|p| p.probability)
    }
}

pub fn assemble(results: &[ResultRecord], verdict: Option<&GateSummary>) -> ReportModel {
    assemble_with(results, verdict, &ReportOptions::default())
}

/// Build the report model. Pure: no I/O, no clock.
///
/// Without explicit options, `norepl` is compared against `repl` when the result set
/// holds both.
pub fn assemble_with(
    results: &[ResultRecord],
    verdict: Option<&GateSummary>,
    options: &ReportOptions,
) -> ReportModel {
    let mut variants: Vec<String> = Vec::new();
    for record in results {
        if !variants.contains(&record.variant) {
            variants.push(record.variant.clone());
        }
    }
    let rank = |variant: &str| variants.iter().position(|v| v == variant).unwrap_or(usize::MAX);

    let priors = results
        .iter()
        .map(|r| r.prior)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let mut endpoints: BTreeMap<String, Vec<ReportPoint>> = BTreeMap::new();
    for record in results {
        endpoints
            .entry(record.endpoint.clone())
            .or_default()
            .push(ReportPoint {
                variant: record.variant.clone(),
                prior: record.prior,
                probability: record.probability,
            });
    }
    for points in endpoints.values_mut() {
        points.sort_by(|a, b| {
            rank(&a.variant)
                .cmp(&rank(&b.variant))
                .then_with(|| a.prior.cmp(&b.prior))
        });
    }

    let (baseline, candidate) = comparison_pair(&variants, options);
    let comparisons = match (&baseline, &candidate) {
        (Some(baseline), Some(candidate)) => compare(&endpoints, &priors, baseline, candidate),
        _ => Vec::new(),
    };

    ReportModel {
        variants,
        priors,
        endpoints,
        baseline,
        candidate,
        comparisons,
        verdict: verdict.cloned(),
    }
}

fn comparison_pair(
    variants: &[String],
    options: &ReportOptions,
) -> (Option<String>, Option<String>) {
    match (&options.baseline, &options.candidate) {
        (None, None) => {
            let present = |name: &str| variants.iter().any(|v| v == name);
            if present(DEFAULT_BASELINE) && present(DEFAULT_CANDIDATE) {
                (
                    Some(DEFAULT_BASELINE.to_owned()),
                    Some(DEFAULT_CANDIDATE.to_owned()),
                )
            } else {
                (None, None)
            }
        }
        (baseline, candidate) => (baseline.clone(), candidate.clone()),
    }
}

fn compare(
    endpoints: &BTreeMap<String, Vec<ReportPoint>>,
    priors: &[FailurePrior],
    baseline: &str,
    candidate: &str,
) -> Vec<Comparison> {
    let lookup = |points: &[ReportPoint], variant: &str, prior: FailurePrior| {
        points
            .iter()
            .find(|p| p.variant == variant && p.prior == prior)
            .map(|p| p.probability)
    };
    let mut comparisons = Vec::new();
    for (endpoint, points) in endpoints {
        for prior in priors {
            let base = lookup(points, baseline, *prior);
            let cand = lookup(points, candidate, *prior);
            if base.is_none() && cand.is_none() {
                continue;
            }
            comparisons.push(Comparison {
                endpoint: endpoint.clone(),
                prior: *prior,
                baseline: base,
                candidate: cand,
                uplift: base.zip(cand).map(|(b, c)| c - b),
            });
        }
    }
    comparisons
}
