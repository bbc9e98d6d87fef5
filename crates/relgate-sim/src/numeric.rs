//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A computed probability fell outside `[0, 1]` (or was NaN) and was clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRangeWarning {
    /// What was being computed, e.g. `availability of text-service`.
    pub subject: String,
    pub value: f64,
    pub clamped: f64,
}

impl std::fmt::Display for NumericRangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} evaluated to {} and was clamped to {}",
            self.subject, self.value, self.clamped
        )
    }
}

/// Range-check a probability. Out-of-range values are clamped into `[0, 1]`, NaN
/// becomes 0, and either case records a warning.
pub fn clamp_probability(
    value: f64,
    subject: impl FnOnce() -> String,
    warnings: &mut Vec<NumericRangeWarning>,
) -> f64 {
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    let warning = NumericRangeWarning {
        subject: subject(),
        value,
        clamped,
    };
    warn!(
        subject = %warning.subject,
        value = warning.value,
        clamped = warning.clamped,
        "probability outside [0, 1] clamped"
    );
    warnings.push(warning);
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_values_pass_through() {
        let mut warnings = Vec::new();
        assert_eq!(clamp_probability(0.25, || "x".into(), &mut warnings), 0.25);
        assert_eq!(clamp_probability(1.0, || "x".into(), &mut warnings), 1.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn out_of_range_values_are_clamped_and_reported() {
        let mut warnings = Vec::new();
        assert_eq!(clamp_probability(1.0 + 1e-12, || "a".into(), &mut warnings), 1.0);
        assert_eq!(clamp_probability(-0.5, || "b".into(), &mut warnings), 0.0);
        assert_eq!(clamp_probability(f64::NAN, || "c".into(), &mut warnings), 0.0);
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[1].subject, "b");
        assert_eq!(warnings[1].value, -0.5);
    }
}
