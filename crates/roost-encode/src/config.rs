//! Encoder configuration.
//!
//! One explicit struct constructed up front and passed by reference into the
//! encoders, instead of globally registered argument objects.

use roost_base::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration shared by all encoder variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Number of pigeons; at least 2.
    pub num_pigeons: u32,
    /// Whether the upper chain border is a hard clause. When false, the
    /// chain encoder closes the top per probe by assumption only.
    pub close_chain_top: bool,
    /// Alternate probing policy: try every pigeon subset large enough to be
    /// unsatisfiable as the forced-closed set, instead of only the full set.
    pub subset_probes: bool,
    /// Materialize each proven subset clause as a permanent clause.
    pub materialize_proved: bool,
    /// Verify that the learned stream reproduces the failed-assumption core
    /// of each probe in the extended-resolution learning phase.
    pub verify_certificates: bool,
}

impl EncoderConfig {
    /// Validates the pigeon count and applies defaults for the rest.
    pub fn new(num_pigeons: u32) -> Result<Self> {
        if num_pigeons < 2 {
            return Err(Error::TooFewPigeons(num_pigeons));
        }
        Ok(Self {
            num_pigeons,
            close_chain_top: true,
            subset_probes: false,
            materialize_proved: false,
            verify_certificates: true,
        })
    }

    /// Sets whether the upper chain border is hard.
    pub fn close_chain_top(mut self, value: bool) -> Self {
        self.close_chain_top = value;
        self
    }

    /// Enables or disables the exhaustive subset probing policy.
    pub fn subset_probes(mut self, value: bool) -> Self {
        self.subset_probes = value;
        self
    }

    /// Enables or disables materializing proven subset clauses.
    pub fn materialize_proved(mut self, value: bool) -> Self {
        self.materialize_proved = value;
        self
    }

    /// Enables or disables certificate verification.
    pub fn verify_certificates(mut self, value: bool) -> Self {
        self.verify_certificates = value;
        self
    }

    /// Number of holes: one fewer than the pigeons.
    pub fn num_holes(&self) -> u32 {
        self.num_pigeons - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_pigeon_counts() {
        assert!(matches!(
            EncoderConfig::new(0),
            Err(Error::TooFewPigeons(0))
        ));
        assert!(matches!(
            EncoderConfig::new(1),
            Err(Error::TooFewPigeons(1))
        ));
        assert!(EncoderConfig::new(2).is_ok());
    }

    #[test]
    fn defaults() {
        let cfg = EncoderConfig::new(4).unwrap();
        assert!(cfg.close_chain_top);
        assert!(!cfg.subset_probes);
        assert!(!cfg.materialize_proved);
        assert!(cfg.verify_certificates);
        assert_eq!(cfg.num_holes(), 3);
    }
}
