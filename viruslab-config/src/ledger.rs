//! Ledger-backed engine parameters: polling cadence, the visual money
//! projection and the cosmetic drama loop.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Player-state poll period (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Visual money micro-tick (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_accrual_interval")]
    pub accrual_interval_ms: u64,

    /// Ether added to the projection per unit on every micro-tick.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_accrual_per_unit")]
    pub accrual_per_unit: f64,

    /// Cosmetic drama loop period (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_drama_interval")]
    pub drama_interval_ms: u64,

    /// Chance per drama tick of flipping to `UNSTABLE`.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_unstable_probability")]
    pub unstable_probability: f64,

    /// Chance an `UNSTABLE` flip also pulses the attack animation.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_attack_pulse_probability")]
    pub attack_pulse_probability: f64,

    /// Cool-down before an `UNSTABLE` flip reverts (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_unstable_revert")]
    pub unstable_revert_ms: u64,

    /// Chance per drama tick of a flavor warning line.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_flavor_probability")]
    pub flavor_probability: f64,

    /// How long a confirmed attack keeps the `MUTATING` state (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_attack_window")]
    pub attack_window_ms: u64,

    /// Display multiplier from units to kills.
    #[serde(default = "default_kills_per_unit")]
    pub kills_per_unit: u64,

    /// Units bought per deploy command.
    #[validate(range(min = 1))]
    #[serde(default = "default_deploy_quantity")]
    pub deploy_quantity: u64,

    /// Value attached to a deploy command (wei).
    #[serde(default = "default_deploy_value")]
    pub deploy_value_wei: u64,

    /// Fixed RNG seed for the drama loop; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_poll_interval() -> u64 {
    2000
}
fn default_accrual_interval() -> u64 {
    100
}
fn default_accrual_per_unit() -> f64 {
    0.000_000_05
}
fn default_drama_interval() -> u64 {
    3000
}
fn default_unstable_probability() -> f64 {
    0.15
}
fn default_attack_pulse_probability() -> f64 {
    0.5
}
fn default_unstable_revert() -> u64 {
    2000
}
fn default_flavor_probability() -> f64 {
    0.05
}
fn default_attack_window() -> u64 {
    3000
}
fn default_kills_per_unit() -> u64 {
    1337
}
fn default_deploy_quantity() -> u64 {
    1
}
fn default_deploy_value() -> u64 {
    // 0.0001 ether, the contract's unit price.
    100_000_000_000_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            accrual_interval_ms: default_accrual_interval(),
            accrual_per_unit: default_accrual_per_unit(),
            drama_interval_ms: default_drama_interval(),
            unstable_probability: default_unstable_probability(),
            attack_pulse_probability: default_attack_pulse_probability(),
            unstable_revert_ms: default_unstable_revert(),
            flavor_probability: default_flavor_probability(),
            attack_window_ms: default_attack_window(),
            kills_per_unit: default_kills_per_unit(),
            deploy_quantity: default_deploy_quantity(),
            deploy_value_wei: default_deploy_value(),
            seed: None,
        }
    }
}
