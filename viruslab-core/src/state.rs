//! View model produced by every engine variant.

use serde::{Deserialize, Serialize};

use crate::log::LogEntry;

/// Transient danger indicator. Anything other than `Stable` always has a
/// pending transition back to `Stable`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VirusStatus {
    #[default]
    Stable,
    Unstable,
    Mutating,
}

/// Read-only snapshot consumed by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub bots: u64,
    pub kills: u64,
    pub money: f64,
    pub status: VirusStatus,
    pub attack_visual: bool,
    pub logs: Vec<LogEntry>,
}

impl EngineState {
    /// `money` for display; non-finite projections collapse to zero.
    pub fn display_money(&self) -> f64 {
        sanitize_amount(self.money)
    }
}

/// Maps NaN and infinities to `0.0`.
#[inline]
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
