/*!
# Viruslab Simulator

An in-process stand-in for the deployed game contract. It keeps player
accounts, accrues rewards against tokio time, confirms submissions after a
fixed block time and broadcasts the contract's events, so the ledger-backed
engine can run offline and under test with paused clocks.

## Key Components:
- **MemoryLedger:** implements the read, event and write seams of `viruslab-core`.
- **Chaos Engine:** optional rejection and dropped-confirmation injection.
*/

pub mod chaos;
pub mod ledger;

pub use chaos::{ChaosInjector, Fault};
pub use ledger::MemoryLedger;
