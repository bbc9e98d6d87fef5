//! ---
//! rg_section: "09-gate"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Release gate evaluation and summaries."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::BTreeSet;

use relgate_common::{DecisionConfig, DecisionMode};
use serde::{Deserialize, Serialize};

use crate::errors::{GateError, Result};

/// Decision policy for one gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    pub threshold: f64,
    pub mode: DecisionMode,
    /// Endpoints to judge; empty judges every endpoint.
    pub filters: BTreeSet<String>,
    /// Release variant to judge; `None` judges every variant.
    pub variant: Option<String>,
}

impl GateConfig {
    pub fn new(threshold: f64, mode: DecisionMode) -> Self {
        Self {
            threshold,
            mode,
            filters: BTreeSet::new(),
            variant: None,
        }
    }

    /// Filters are trimmed and blanks dropped.
    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filters = filters
            .into_iter()
            .map(|f| f.as_ref().trim().to_owned())
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    /// Variant names are trimmed and lowercased; a blank name selects every variant.
    pub fn with_variant(mut self, variant: Option<&str>) -> Self {
        self.variant = variant
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(GateError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    pub fn matches_variant(&self, variant: &str) -> bool {
        self.variant
            .as_deref()
            .map_or(true, |wanted| wanted.eq_ignore_ascii_case(variant))
    }

    pub fn matches_endpoint(&self, endpoint: &str) -> bool {
        self.filters.is_empty() || self.filters.contains(endpoint)
    }
}

impl From<&DecisionConfig> for GateConfig {
    fn from(config: &DecisionConfig) -> Self {
        GateConfig::new(config.threshold, config.mode)
            .with_filters(&config.filters)
            .with_variant(config.variant.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_and_variant_are_normalised() {
        let config = GateConfig::new(0.9, DecisionMode::Any)
            .with_filters([" /compose ", "", "  "])
            .with_variant(Some(" NoRepl "));
        assert_eq!(config.filters.iter().collect::<Vec<_>>(), vec!["/compose"]);
        assert_eq!(config.variant.as_deref(), Some("norepl"));
        assert!(config.matches_variant("norepl"));
        assert!(!config.matches_variant("repl"));
        assert!(config.matches_endpoint("/compose"));
        assert!(!config.matches_endpoint("/timeline"));

        let blank = GateConfig::new(0.9, DecisionMode::Any).with_variant(Some("  "));
        assert_eq!(blank.variant, None);
    }

    #[test]
    fn threshold_must_be_a_probability() {
        assert!(GateConfig::new(1.0, DecisionMode::Mean).validate().is_ok());
        assert!(matches!(
            GateConfig::new(1.2, DecisionMode::Any).validate(),
            Err(GateError::InvalidThreshold(t)) if t == 1.2
        ));
        assert!(GateConfig::new(f64::NAN, DecisionMode::Any).validate().is_err());
    }

    #[test]
    fn built_from_decision_config() {
        let decision = DecisionConfig {
            threshold: 0.99,
            mode: DecisionMode::Mean,
            filters: vec!["/a".into()],
            variant: Some("Repl".into()),
            ..DecisionConfig::default()
        };
        let config = GateConfig::from(&decision);
        assert_eq!(config.threshold, 0.99);
        assert_eq!(config.mode, DecisionMode::Mean);
        assert_eq!(config.variant.as_deref(), Some("repl"));
    }
}
