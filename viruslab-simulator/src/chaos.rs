//! Chaos module.
//!
//! Fault injection for the emulated ledger: a submission can be refused
//! outright or accepted and then silently lost.

use rand::Rng;

use viruslab_config::ChaosConfig;

/// What happens to one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    Reject,
    Drop,
}

#[derive(Debug, Clone)]
pub struct ChaosInjector {
    config: ChaosConfig,
}

impl ChaosInjector {
    pub fn new(config: ChaosConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.rejection_probability > 0.0 || self.config.drop_probability > 0.0
    }

    /// Rejection is rolled first; only accepted submissions can be dropped.
    pub fn decide<R: Rng>(&self, rng: &mut R) -> Fault {
        if !self.is_enabled() {
            return Fault::None;
        }
        if rng.random_bool(self.config.rejection_probability) {
            Fault::Reject
        } else if rng.random_bool(self.config.drop_probability) {
            Fault::Drop
        } else {
            Fault::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn disabled_chaos_never_faults() {
        let chaos = ChaosInjector::new(ChaosConfig::default());
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(!chaos.is_enabled());
        assert!((0..100).all(|_| chaos.decide(&mut rng) == Fault::None));
    }

    #[test]
    fn certain_rejection_wins_over_drop() {
        let chaos = ChaosInjector::new(ChaosConfig {
            rejection_probability: 1.0,
            drop_probability: 1.0,
        });
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(chaos.decide(&mut rng), Fault::Reject);
    }

    #[test]
    fn certain_drop() {
        let chaos = ChaosInjector::new(ChaosConfig {
            rejection_probability: 0.0,
            drop_probability: 1.0,
        });
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(chaos.decide(&mut rng), Fault::Drop);
    }
}
