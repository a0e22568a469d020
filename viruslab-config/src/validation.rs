//! Custom validation functions shared by the configuration sections.

use tracing_subscriber::EnvFilter;
use validator::ValidationError;

use crate::local::LocalConfig;

/// Every timer period must be strictly positive.
pub fn validate_period_ms(value: u64) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::new("period_must_be_positive"))
    }
}

/// Kill rolls are drawn from `kills_per_bot_min..=kills_per_bot_max`.
pub fn validate_kill_range(config: &LocalConfig) -> Result<(), ValidationError> {
    if config.kills_per_bot_min <= config.kills_per_bot_max {
        Ok(())
    } else {
        Err(ValidationError::new("kill_range_inverted"))
    }
}

/// Refunding more than a unit costs would mint money from nothing.
pub fn validate_refund(config: &LocalConfig) -> Result<(), ValidationError> {
    if config.recall_refund <= config.unit_cost {
        Ok(())
    } else {
        Err(ValidationError::new("refund_exceeds_cost"))
    }
}

/// Accepts exactly what `tracing_subscriber::EnvFilter` accepts, minus the
/// blank filter (which would silence everything).
pub fn validate_log_filter(filter: &str) -> Result<(), ValidationError> {
    if !filter.trim().is_empty() && EnvFilter::try_new(filter).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_filter"))
    }
}
