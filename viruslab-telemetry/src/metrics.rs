//! Prometheus counters for engine activity.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    /// Main-loop ticks, labelled by engine variant.
    pub ticks: IntCounterVec,
    /// Player commands, labelled by command name.
    pub commands: IntCounterVec,
    /// Ledger events addressed to the connected player.
    pub ledger_events: IntCounter,
    /// Player-state read latency.
    pub poll_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let ticks = IntCounterVec::new(
            Opts::new("viruslab_engine_ticks_total", "Timer ticks processed"),
            &["engine"],
        )?;
        let commands = IntCounterVec::new(
            Opts::new("viruslab_commands_total", "Player commands received"),
            &["command"],
        )?;
        let ledger_events = IntCounter::new(
            "viruslab_ledger_events_total",
            "Ledger events matching the connected identity",
        )?;
        let poll_latency = Histogram::with_opts(
            HistogramOpts::new(
                "viruslab_poll_latency_seconds",
                "Player-state read latency",
            )
            .buckets(vec![0.001, 0.01, 0.1, 0.5, 2.0]),
        )?;

        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(commands.clone()))?;
        registry.register(Box::new(ledger_events.clone()))?;
        registry.register(Box::new(poll_latency.clone()))?;

        Ok(Self {
            registry,
            ticks,
            commands,
            ledger_events,
            poll_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn inc_tick(&self, engine: &str) {
        self.ticks.with_label_values(&[engine]).inc();
    }

    pub fn inc_command(&self, command: &str) {
        self.commands.with_label_values(&[command]).inc();
    }
}
