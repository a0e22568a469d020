//! ## viruslab-cli
//! **Terminal front-end for the virus lab**
//! Drives a session through the engine selector, either fully offline on the
//! local simulation or against the in-process ledger as a connected wallet.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use viruslab_telemetry::{EventLogger, MetricsRecorder};

mod commands;
mod session;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;
    EventLogger::init(&config.telemetry.log_filter);

    match cli.command {
        Commands::Play(args) => {
            let metrics = Arc::new(MetricsRecorder::new().context("registering metrics")?);
            session::play(config, args, metrics).await
        }
        Commands::Config => commands::print_config(&config),
    }
}
