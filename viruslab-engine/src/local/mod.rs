//! Local Simulation Engine: offline state machine plus the actor that drives it.

mod actor;
mod simulation;

pub use actor::LocalEngine;
pub use simulation::{classify_roll, LocalSimulation, LocalTimer, TickEvent};
