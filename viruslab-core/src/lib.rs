//! # viruslab-core
//!
//! Foundation layer shared by every engine variant.
//!
//! ### Key Submodules:
//! - `state`: the view model handed to the presentation layer
//! - `log`: bounded, oldest-first event log with time-based ids
//! - `contract`: the `GameEngine` query/command surface
//! - `ledger`: seams to the external read/subscribe/write collaborator
//! - `connection`: wallet connection signal consumed by the selector

pub mod connection;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod log;
pub mod state;

pub mod prelude {
    pub use crate::connection::ConnectionStatus;
    pub use crate::contract::GameEngine;
    pub use crate::error::EngineError;
    pub use crate::ledger::*;
    pub use crate::log::{EventLog, LogEntry, LogKind};
    pub use crate::state::{EngineState, VirusStatus};
}

pub use contract::GameEngine;
pub use error::EngineError;
pub use log::{EventLog, LogEntry, LogKind};
pub use state::{EngineState, VirusStatus};
