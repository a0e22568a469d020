//! # viruslab-engine
//!
//! The two game-state engines and the selector that puts one of them in
//! front of the presentation layer.
//!
//! Each engine is a single tokio task. A pure state machine holds the game
//! state; the task feeds it timer ticks, commands and collaborator results
//! one at a time and publishes an [`EngineState`](viruslab_core::EngineState)
//! snapshot after every transition.

mod handle;
pub mod ledger;
pub mod local;
pub mod narrative;
pub mod schedule;
pub mod selector;

pub use handle::EngineHandle;
pub use ledger::{LedgerEngine, LedgerMirror};
pub use local::{LocalEngine, LocalSimulation};
pub use schedule::Scheduled;
pub use selector::{EngineKind, EngineSelector};
