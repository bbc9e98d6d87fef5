//! ---
//! rg_section: "07-simulation"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Reliability estimation engines."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Deterministic seed derivation for sampled estimates.

use sha2::{Digest, Sha256};

/// Seed for one (variant, prior) unit. Stable across runs and platforms.
pub fn unit_seed(base: u64, variant: &str, prior: f64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update((variant.len() as u64).to_le_bytes());
    hasher.update(variant.as_bytes());
    hasher.update(prior.to_bits().to_le_bytes());
    fold(hasher.finalize().as_slice())
}

/// Seed for one block of trials within a unit.
pub fn block_seed(unit: u64, block: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(unit.to_le_bytes());
    hasher.update(block.to_le_bytes());
    fold(hasher.finalize().as_slice())
}

fn fold(digest: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_stable_and_distinct() {
        assert_eq!(unit_seed(7, "repl", 0.1), unit_seed(7, "repl", 0.1));
        assert_ne!(unit_seed(7, "repl", 0.1), unit_seed(7, "norepl", 0.1));
        assert_ne!(unit_seed(7, "repl", 0.1), unit_seed(7, "repl", 0.05));
        assert_ne!(unit_seed(7, "repl", 0.1), unit_seed(8, "repl", 0.1));
        assert_ne!(block_seed(1, 0), block_seed(1, 1));
    }
}
