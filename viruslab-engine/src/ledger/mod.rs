//! External-Source Engine: mirrors a ledger-held player record and turns its
//! events into narrative.

mod actor;
mod mirror;

pub use actor::LedgerEngine;
pub use mirror::{LedgerMirror, LedgerTimer};
