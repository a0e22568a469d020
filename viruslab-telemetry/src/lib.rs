//! # Viruslab Telemetry
//!
//! Structured logging and Prometheus counters for the game engines.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
