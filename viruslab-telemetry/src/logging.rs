//! Structured logging with tracing and OpenTelemetry attributes.
//!
//! Game-log lines are what the player sees; these events are what an
//! operator sees. Command submissions, confirmations and engine switches go
//! through `EventLogger::log_event` so they share a span shape.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
    /// A second call is a no-op.
    pub fn init(default_filter: &str) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let installed = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .try_init();
        if let Err(err) = installed {
            tracing::debug!("global subscriber already installed: {err}");
        }
    }

    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!("game_event", event_type = event_type, otel.kind = "INTERNAL");

        async {
            tracing::info!(metadata = ?metadata, "Game event recorded");
        }
        .instrument(span)
        .await
    }
}
