//! In-process ledger emulation parameters.
//!
//! Drives `viruslab-simulator`'s `MemoryLedger`, which stands in for the
//! deployed contract during offline sessions and tests.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Seed for deterministic ledger behavior.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Delay between acceptance and confirmation (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_block_time")]
    pub block_time_ms: u64,

    /// Price of one unit (wei).
    #[serde(default = "default_unit_price")]
    pub unit_price_wei: u64,

    /// Rewards accrued per unit per second (wei).
    #[serde(default = "default_reward_rate")]
    pub reward_per_unit_per_sec_wei: u64,

    /// Chance a claim is intercepted by an attack.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_attack_probability")]
    pub attack_probability: f64,

    /// Chance a confirmed block raises an anomaly for the sender.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_anomaly_probability")]
    pub anomaly_probability: f64,

    /// Fault injection.
    #[validate(nested)]
    #[serde(default)]
    pub chaos: ChaosConfig,
}

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ChaosConfig {
    /// Chance a submission is refused outright (0.0 to 1.0).
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub rejection_probability: f64,

    /// Chance an accepted submission never confirms (0.0 to 1.0).
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub drop_probability: f64,
}

fn default_seed() -> u64 {
    42
}
fn default_block_time() -> u64 {
    1000
}
fn default_unit_price() -> u64 {
    100_000_000_000_000
}
fn default_reward_rate() -> u64 {
    500_000_000_000
}
fn default_attack_probability() -> f64 {
    0.2
}
fn default_anomaly_probability() -> f64 {
    0.1
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            block_time_ms: default_block_time(),
            unit_price_wei: default_unit_price(),
            reward_per_unit_per_sec_wei: default_reward_rate(),
            attack_probability: default_attack_probability(),
            anomaly_probability: default_anomaly_probability(),
            chaos: ChaosConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_chaos_ranges_are_checked() {
        assert!(SimulatorConfig::default().validate().is_ok());

        let config = SimulatorConfig {
            chaos: ChaosConfig {
                drop_probability: 1.5,
                ..ChaosConfig::default()
            },
            ..SimulatorConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.to_string().contains("drop_probability"));
    }
}
