//! Local simulation engine parameters.
//!
//! Defaults reproduce the offline game loop: a 2 s tick, 100 credit units
//! refunded at 50, and a 10 % mutation band per tick.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[validate(schema(function = validation::validate_kill_range))]
#[validate(schema(function = validation::validate_refund))]
pub struct LocalConfig {
    /// Main loop period (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// How long an attack pulse stays visible (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_attack_pulse")]
    pub attack_pulse_ms: u64,

    /// Delay between a mutation starting and resolving (milliseconds).
    #[validate(custom(function = validation::validate_period_ms))]
    #[serde(default = "default_mutation_delay")]
    pub mutation_delay_ms: u64,

    /// Price of one bot.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_unit_cost")]
    pub unit_cost: f64,

    /// Money returned when a bot is recalled.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_recall_refund")]
    pub recall_refund: f64,

    /// Money earned per bot per tick.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_income_per_bot")]
    pub income_per_bot: f64,

    #[serde(default = "default_kills_min")]
    pub kills_per_bot_min: u64,

    #[serde(default = "default_kills_max")]
    pub kills_per_bot_max: u64,

    /// Chance per tick of an attack pulse while bots are deployed.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_attack_visual_probability")]
    pub attack_visual_probability: f64,

    /// Width of the mutation band at the bottom of the event roll.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_mutation_probability")]
    pub mutation_probability: f64,

    /// Rolls strictly above this produce a flavor line.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_flavor_threshold")]
    pub flavor_threshold: f64,

    /// Chance a resolved mutation costs a bot.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_unit_loss_probability")]
    pub unit_loss_probability: f64,

    #[serde(default = "default_initial_bots")]
    pub initial_bots: u64,

    #[serde(default = "default_initial_kills")]
    pub initial_kills: u64,

    #[validate(range(min = 0.0))]
    #[serde(default = "default_initial_money")]
    pub initial_money: f64,

    /// Fixed RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_tick_interval() -> u64 {
    2000
}
fn default_attack_pulse() -> u64 {
    500
}
fn default_mutation_delay() -> u64 {
    3000
}
fn default_unit_cost() -> f64 {
    100.0
}
fn default_recall_refund() -> f64 {
    50.0
}
fn default_income_per_bot() -> f64 {
    0.5
}
fn default_kills_min() -> u64 {
    1
}
fn default_kills_max() -> u64 {
    3
}
fn default_attack_visual_probability() -> f64 {
    0.3
}
fn default_mutation_probability() -> f64 {
    0.10
}
fn default_flavor_threshold() -> f64 {
    0.95
}
fn default_unit_loss_probability() -> f64 {
    0.5
}
fn default_initial_bots() -> u64 {
    1
}
fn default_initial_kills() -> u64 {
    1240
}
fn default_initial_money() -> f64 {
    500.0
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            attack_pulse_ms: default_attack_pulse(),
            mutation_delay_ms: default_mutation_delay(),
            unit_cost: default_unit_cost(),
            recall_refund: default_recall_refund(),
            income_per_bot: default_income_per_bot(),
            kills_per_bot_min: default_kills_min(),
            kills_per_bot_max: default_kills_max(),
            attack_visual_probability: default_attack_visual_probability(),
            mutation_probability: default_mutation_probability(),
            flavor_threshold: default_flavor_threshold(),
            unit_loss_probability: default_unit_loss_probability(),
            initial_bots: default_initial_bots(),
            initial_kills: default_initial_kills(),
            initial_money: default_initial_money(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_local_config_is_valid() {
        LocalConfig::default()
            .validate()
            .expect("Default config should be valid");
    }

    #[test]
    fn inverted_kill_range_rejected() {
        let config = LocalConfig {
            kills_per_bot_min: 5,
            kills_per_bot_max: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn probability_out_of_range_rejected() {
        let config = LocalConfig {
            mutation_probability: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn refund_above_cost_rejected() {
        let config = LocalConfig {
            recall_refund: 150.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
