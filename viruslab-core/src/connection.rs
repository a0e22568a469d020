//! Wallet connection signal. Owned by the outside world, read by the selector.

use crate::ledger::Identity;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected(Identity),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ConnectionStatus::Connected(identity) => Some(identity),
            ConnectionStatus::Disconnected => None,
        }
    }
}
