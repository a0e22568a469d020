//! Seams to the external ledger: player-state reads, event subscriptions and
//! command submission.
//!
//! Amounts are carried in wei (`u128`) and only converted to ether at the
//! display boundary.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, oneshot};

pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Account address. Compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confirmed state as returned by `getPlayerState`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub units: u64,
    pub pending_rewards: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    RewardsClaimed {
        player: Identity,
        attack_occurred: bool,
        amount: u128,
    },
    UnitLost {
        player: Identity,
        count: u64,
    },
    AnomalyDetected {
        player: Identity,
        message: String,
    },
}

impl LedgerEvent {
    pub fn player(&self) -> &Identity {
        match self {
            LedgerEvent::RewardsClaimed { player, .. }
            | LedgerEvent::UnitLost { player, .. }
            | LedgerEvent::AnomalyDetected { player, .. } => player,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::RewardsClaimed { .. } => "RewardsClaimed",
            LedgerEvent::UnitLost { .. } => "UnitLost",
            LedgerEvent::AnomalyDetected { .. } => "AnomalyDetected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    DeployUnit { quantity: u64, attached_value: u128 },
    RecallOperation,
    ExitProtocol,
}

impl LedgerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::DeployUnit { .. } => "deployUnit",
            LedgerCommand::RecallOperation => "recallOperation",
            LedgerCommand::ExitProtocol => "exitProtocol",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Rejected(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// A command accepted for broadcast. `confirmation` resolves once the ledger
/// has included (or reverted) it; a dropped sender means it never will.
#[derive(Debug)]
pub struct Submission {
    pub tx_hash: TxHash,
    pub confirmation: oneshot::Receiver<Result<(), LedgerError>>,
}

#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// `Ok(None)` when the ledger has no record of the player yet.
    async fn player_state(&self, player: &Identity) -> Result<Option<PlayerState>, LedgerError>;
}

pub trait LedgerEvents: Send + Sync {
    /// Every subscriber receives all batches; filtering is the caller's job.
    fn subscribe(&self) -> broadcast::Receiver<Vec<LedgerEvent>>;
}

#[async_trait]
pub trait LedgerWriter: Send + Sync {
    async fn submit(
        &self,
        player: &Identity,
        command: LedgerCommand,
    ) -> Result<Submission, LedgerError>;
}

/// Everything the ledger-backed engine needs from its collaborator.
pub trait Ledger: LedgerReader + LedgerEvents + LedgerWriter {}

impl<T: LedgerReader + LedgerEvents + LedgerWriter> Ledger for T {}

/// Minimal decimal rendering of a wei amount, e.g. `0.0001` or `1`.
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:018}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

pub fn wei_to_ether(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETHER as f64
}
