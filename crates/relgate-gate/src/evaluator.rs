//! ---
//! rg_section: "09-gate"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Release gate evaluation and summaries."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::{BTreeMap, BTreeSet};

use relgate_common::{DecisionMode, FailurePrior};
use relgate_logging::{log_stage_event, LogContext, StageOutcome};
use relgate_scenario::ResultRecord;
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::errors::{GateError, Result};

/// A selected (endpoint, prior) probability below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub endpoint: String,
    pub prior: FailurePrior,
    pub variant: String,
    pub probability: f64,
}

/// One selected probability, as listed per endpoint in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub pfail: FailurePrior,
    pub variant: String,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub passed: bool,
    pub mode: DecisionMode,
    pub threshold: f64,
    pub variant: Option<String>,
    /// Ordered by endpoint, prior, then variant. Empty when the gate passes.
    pub violations: Vec<Violation>,
    /// Minimum probability for `any`. For `mean`, the mean of per-endpoint means,
    /// taken per variant; the lowest variant value when several are selected.
    pub aggregate: f64,
    pub reason: String,
    /// Selected probabilities per endpoint, ordered by prior then variant.
    pub scores: BTreeMap<String, Vec<Score>>,
}

impl GateVerdict {
    pub fn exit_code(&self) -> u8 {
        if self.passed {
            0
        } else {
            1
        }
    }
}

/// Judge `records` against `config`.
pub fn evaluate(records: &[ResultRecord], config: &GateConfig) -> Result<GateVerdict> {
    config.validate()?;

    let selected = records
        .iter()
        .filter(|r| config.matches_variant(&r.variant) && config.matches_endpoint(&r.endpoint))
        .collect::<Vec<_>>();
    if selected.is_empty() {
        return Err(GateError::EmptyResultSet {
            variant: config.variant.clone(),
        });
    }

    let mut scores: BTreeMap<String, Vec<Score>> = BTreeMap::new();
    for record in &selected {
        scores.entry(record.endpoint.clone()).or_default().push(Score {
            pfail: record.prior,
            variant: record.variant.clone(),
            reliability: record.probability,
        });
    }
    for entries in scores.values_mut() {
        entries.sort_by(|a, b| a.pfail.cmp(&b.pfail).then_with(|| a.variant.cmp(&b.variant)));
    }

    let mut below = selected
        .iter()
        .filter(|r| r.probability < config.threshold)
        .map(|r| Violation {
            endpoint: r.endpoint.clone(),
            prior: r.prior,
            variant: r.variant.clone(),
            probability: r.probability,
        })
        .collect::<Vec<_>>();
    below.sort_by(|a, b| {
        a.endpoint
            .cmp(&b.endpoint)
            .then_with(|| a.prior.cmp(&b.prior))
            .then_with(|| a.variant.cmp(&b.variant))
    });

    let (passed, aggregate, summary) = match config.mode {
        DecisionMode::Any => {
            let min = selected
                .iter()
                .map(|r| r.probability)
                .fold(f64::INFINITY, f64::min);
            (
                below.is_empty(),
                min,
                format!("min reliability={:.4} (threshold={})", min, config.threshold),
            )
        }
        DecisionMode::Mean => {
            // Without a designated variant each variant must clear the threshold on
            // its own, so the weakest variant mean decides.
            let (variant, mean) = variant_means(&selected)
                .into_iter()
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or_default();
            let cited = if distinct_variants(&selected) > 1 {
                format!(" [{}]", variant)
            } else {
                String::new()
            };
            (
                mean >= config.threshold,
                mean,
                format!(
                    "mean reliability={:.4}{} (threshold={})",
                    mean, cited, config.threshold
                ),
            )
        }
    };

    let violations = if passed { Vec::new() } else { below };
    let reason = if violations.is_empty() {
        summary
    } else {
        let cited = violations
            .iter()
            .map(|v| format_violation(v, config.variant.is_none()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Violations: {}; {}", cited, summary)
    };

    let context = LogContext::new()
        .with_variant(config.variant.as_deref().unwrap_or("*"))
        .with_stage("gate");
    log_stage_event(
        Some(&context),
        if passed { "gate_passed" } else { "gate_failed" },
        &reason,
        if passed {
            StageOutcome::Success
        } else {
            StageOutcome::Fault
        },
    );

    Ok(GateVerdict {
        passed,
        mode: config.mode,
        threshold: config.threshold,
        variant: config.variant.clone(),
        violations,
        aggregate,
        reason,
        scores,
    })
}

fn distinct_variants(selected: &[&ResultRecord]) -> usize {
    selected
        .iter()
        .map(|r| r.variant.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Per variant: the mean over endpoints of each endpoint's mean over priors.
fn variant_means(selected: &[&ResultRecord]) -> Vec<(String, f64)> {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for record in selected {
        grouped
            .entry(record.variant.as_str())
            .or_default()
            .entry(record.endpoint.as_str())
            .or_default()
            .push(record.probability);
    }
    grouped
        .into_iter()
        .map(|(variant, endpoints)| {
            let total = endpoints
                .values()
                .map(|values| values.iter().sum::<f64>() / values.len() as f64)
                .sum::<f64>();
            (variant.to_owned(), total / endpoints.len() as f64)
        })
        .collect()
}

fn format_violation(violation: &Violation, with_variant: bool) -> String {
    let mut cited = format!(
        "{} @ pfail={} -> {:.4}",
        violation.endpoint, violation.prior, violation.probability
    );
    if with_variant {
        cited.push_str(&format!(" [{}]", violation.variant));
    }
    cited
}

#[cfg(test)]
mod tests {
    use super::*;
    use relgate_sim::Estimate;

    fn record(variant: &str, prior: f64, endpoint: &str, probability: f64) -> ResultRecord {
        ResultRecord {
            variant: variant.into(),
            prior: FailurePrior::new(prior).unwrap(),
            endpoint: endpoint.into(),
            probability,
            estimate: Estimate::Exact,
            root: endpoint.trim_start_matches('/').into(),
            services: Vec::new(),
        }
    }

    #[test]
    fn violations_are_ordered_endpoint_prior_variant() {
        let records = vec![
            record("b", 0.1, "/y", 0.5),
            record("a", 0.1, "/y", 0.5),
            record("a", 0.01, "/y", 0.6),
            record("a", 0.1, "/x", 0.7),
        ];
        let verdict = evaluate(&records, &GateConfig::new(0.9, DecisionMode::Any)).unwrap();
        let order = verdict
            .violations
            .iter()
            .map(|v| (v.endpoint.as_str(), v.prior.value(), v.variant.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                ("/x", 0.1, "a"),
                ("/y", 0.01, "a"),
                ("/y", 0.1, "a"),
                ("/y", 0.1, "b")
            ]
        );
        assert!(verdict.reason.starts_with("Violations: /x @ pfail=0.1 -> 0.7000 [a]"));
        assert_eq!(verdict.exit_code(), 1);
    }

    #[test]
    fn mean_averages_priors_then_endpoints() {
        // /a averages 0.9, /b averages 1.0.
        let records = vec![
            record("v", 0.01, "/a", 1.0),
            record("v", 0.1, "/a", 0.8),
            record("v", 0.01, "/b", 1.0),
        ];
        let verdict = evaluate(&records, &GateConfig::new(0.94, DecisionMode::Mean)).unwrap();
        assert!(verdict.passed);
        assert!((verdict.aggregate - 0.95).abs() < 1e-12);
        assert!(verdict.violations.is_empty());
        assert_eq!(verdict.reason, "mean reliability=0.9500 (threshold=0.94)");

        let strict = evaluate(&records, &GateConfig::new(0.96, DecisionMode::Mean)).unwrap();
        assert!(!strict.passed);
        assert_eq!(strict.violations.len(), 1);
        assert_eq!(strict.violations[0].endpoint, "/a");
    }

    #[test]
    fn mean_without_a_variant_is_decided_by_the_weakest_variant() {
        let records = vec![record("norepl", 0.1, "/a", 0.81), record("repl", 0.1, "/a", 0.998)];

        let pooled = evaluate(&records, &GateConfig::new(0.9, DecisionMode::Mean)).unwrap();
        assert!(!pooled.passed);
        assert!((pooled.aggregate - 0.81).abs() < 1e-12);
        assert_eq!(
            pooled.reason,
            "Violations: /a @ pfail=0.1 -> 0.8100 [norepl]; \
             mean reliability=0.8100 [norepl] (threshold=0.9)"
        );

        let repl = GateConfig::new(0.9, DecisionMode::Mean).with_variant(Some("repl"));
        let designated = evaluate(&records, &repl).unwrap();
        assert!(designated.passed);
        assert!((designated.aggregate - 0.998).abs() < 1e-12);
    }
}
