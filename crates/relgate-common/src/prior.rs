//! ---
//! rg_section: "01-core-functionality"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Shared primitives and utilities for the reliability gate."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a failure prior is NaN or lies outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("failure prior {0} is outside [0, 1]")]
pub struct InvalidPrior(pub f64);

/// Assumed independent per-call failure probability for one simulation run.
///
/// Priors are totally ordered so they can key ordered maps and sort result
/// sets deterministically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FailurePrior(f64);

impl FailurePrior {
    pub const ZERO: FailurePrior = FailurePrior(0.0);
    pub const ONE: FailurePrior = FailurePrior(1.0);

    pub fn new(value: f64) -> Result<Self, InvalidPrior> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(InvalidPrior(value));
        }
        // -0.0 and 0.0 must compare equal under total_cmp.
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FailurePrior {
    type Error = InvalidPrior;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FailurePrior> for f64 {
    fn from(prior: FailurePrior) -> Self {
        prior.0
    }
}

impl PartialEq for FailurePrior {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FailurePrior {}

impl PartialOrd for FailurePrior {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FailurePrior {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for FailurePrior {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for FailurePrior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert_eq!(FailurePrior::new(-0.1), Err(InvalidPrior(-0.1)));
        assert_eq!(FailurePrior::new(1.5), Err(InvalidPrior(1.5)));
        assert!(FailurePrior::new(f64::NAN).is_err());
        assert!(FailurePrior::new(0.0).is_ok());
        assert!(FailurePrior::new(1.0).is_ok());
    }

    #[test]
    fn negative_zero_collapses_into_zero() {
        let priors: BTreeSet<FailurePrior> = [FailurePrior::new(-0.0).unwrap(), FailurePrior::ZERO]
            .into_iter()
            .collect();
        assert_eq!(priors.len(), 1);
    }

    #[test]
    fn deserialization_validates_range() {
        let ok: FailurePrior = parse_toml_prior("0.05").unwrap();
        assert_eq!(ok.value(), 0.05);
        assert!(parse_toml_prior("2.0").is_err());
    }

    fn parse_toml_prior(raw: &str) -> Result<FailurePrior, toml::de::Error> {
        #[derive(Deserialize)]
        struct Wrapper {
            prior: FailurePrior,
        }
        toml::from_str::<Wrapper>(&format!("prior = {raw}")).map(|w| w.prior)
    }
}
