//! Shared query/command surface implemented by both engine variants.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::state::EngineState;

/// Uniform interface the presentation layer talks to.
///
/// Commands never fail for domain reasons: a refused deploy or a rejected
/// submission shows up as a log entry. `Err` means the engine itself is
/// unreachable or does not support the command.
#[async_trait]
pub trait GameEngine: Send + Sync {
    /// Latest published state. Never blocks.
    fn snapshot(&self) -> EngineState;

    /// Acquire one unit.
    async fn deploy_bot(&self) -> Result<(), EngineError>;

    /// Release one unit.
    async fn remove_bot(&self) -> Result<(), EngineError>;

    /// Full liquidation. Only meaningful when backed by a ledger.
    async fn exit_game(&self) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("exit_game"))
    }
}
