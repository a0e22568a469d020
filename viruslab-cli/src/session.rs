//! One interactive session: spawn the engines, issue the scripted commands
//! and stream new game-log lines until the clock runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, instrument, warn};
use viruslab_config::ViruslabConfig;
use viruslab_core::connection::ConnectionStatus;
use viruslab_core::ledger::Identity;
use viruslab_core::{EngineError, EngineState, LogEntry, LogKind};
use viruslab_engine::{EngineKind, EngineSelector};
use viruslab_simulator::MemoryLedger;
use viruslab_telemetry::MetricsRecorder;

use crate::commands::PlayArgs;

#[instrument(skip_all, fields(connect = args.connect.as_deref().unwrap_or("offline")))]
pub async fn play(
    mut config: ViruslabConfig,
    args: PlayArgs,
    metrics: Arc<MetricsRecorder>,
) -> anyhow::Result<()> {
    if let Some(seed) = args.seed {
        config.local.seed = Some(seed);
        config.ledger.seed = Some(seed);
        config.simulator.seed = seed;
    }
    // Long enough for a block to land and the follow-up read to come back.
    let settle = Duration::from_millis(config.simulator.block_time_ms + 200);

    let ledger = MemoryLedger::new(config.simulator.clone());
    let mut selector = EngineSelector::new(&config, Arc::new(ledger), Arc::clone(&metrics));
    selector.set_intro_finished(true).await?;
    if let Some(address) = &args.connect {
        selector
            .set_connection(ConnectionStatus::Connected(Identity::new(address)))
            .await?;
    }
    let kind = selector.active_kind();
    info!(engine = kind.as_str(), "session started");

    let mut printer = LogPrinter::default();
    let mut feed = selector.subscribe();
    printer.print(&feed.borrow_and_update());

    for _ in 0..args.deploy {
        selector.active().deploy_bot().await?;
    }

    let duration = Duration::from_secs(args.duration_secs);
    let deadline = sleep(duration);
    let halfway = sleep(duration / 2);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(deadline, halfway, interrupted);
    let mut recalled = args.recall == 0;

    loop {
        tokio::select! {
            changed = feed.changed() => {
                if changed.is_err() {
                    warn!("engine stopped publishing state");
                    break;
                }
                let state = feed.borrow_and_update().clone();
                printer.print(&state);
            }
            _ = &mut halfway, if !recalled => {
                recalled = true;
                for _ in 0..args.recall {
                    selector.active().remove_bot().await?;
                }
            }
            _ = &mut deadline => break,
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    if args.exit {
        match selector.active().exit_game().await {
            Ok(()) => sleep(settle).await,
            Err(EngineError::Unsupported(_)) => {
                println!("exit is only available to connected sessions");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let state = selector.active().snapshot();
    printer.print(&state);
    println!("{}", summary(kind, &state));
    selector.shutdown().await?;

    if args.metrics || config.telemetry.dump_metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

/// Prints each log entry once, in order, as snapshots arrive.
#[derive(Debug, Default)]
struct LogPrinter {
    last_id: u64,
}

impl LogPrinter {
    fn print(&mut self, state: &EngineState) {
        for line in self.fresh_lines(state) {
            println!("{line}");
        }
    }

    fn fresh_lines(&mut self, state: &EngineState) -> Vec<String> {
        let fresh: Vec<&LogEntry> = state.logs.iter().filter(|e| e.id > self.last_id).collect();
        if let Some(newest) = fresh.last() {
            self.last_id = newest.id;
        }
        fresh.into_iter().map(render).collect()
    }
}

fn render(entry: &LogEntry) -> String {
    let tag = match entry.kind {
        LogKind::Info => "INFO",
        LogKind::Danger => "DANGER",
        LogKind::Success => "OK",
        LogKind::Warning => "WARN",
    };
    format!("[{}] {:<6} {}", entry.timestamp, tag, entry.text)
}

fn summary(kind: EngineKind, state: &EngineState) -> String {
    let money = match kind {
        EngineKind::Local => format!("${:.2}", state.display_money()),
        EngineKind::Ledger => format!("{:.6} ETH", state.display_money()),
    };
    format!(
        "bots={} kills={} money={} status={:?}",
        state.bots, state.kills, money, state.status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use viruslab_core::EventLog;

    fn state_with(log: &EventLog) -> EngineState {
        EngineState {
            logs: log.to_vec(),
            ..EngineState::default()
        }
    }

    #[test]
    fn each_entry_is_printed_once() {
        let mut log = EventLog::default();
        let mut printer = LogPrinter::default();
        log.push("first", LogKind::Info);
        assert_eq!(printer.fresh_lines(&state_with(&log)).len(), 1);

        log.push("second", LogKind::Danger);
        let lines = printer.fresh_lines(&state_with(&log));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("DANGER second"));
        assert!(printer.fresh_lines(&state_with(&log)).is_empty());
    }

    #[test]
    fn summary_formats_money_per_engine() {
        let state = EngineState {
            bots: 2,
            kills: 2674,
            money: 0.000125,
            ..EngineState::default()
        };
        assert!(summary(EngineKind::Ledger, &state).contains("money=0.000125 ETH"));
        assert!(summary(EngineKind::Local, &state).contains("money=$0.00"));
    }

    #[tokio::test(start_paused = true)]
    async fn offline_session_runs_to_completion() {
        let args = PlayArgs {
            connect: None,
            duration_secs: 5,
            deploy: 1,
            recall: 1,
            exit: true,
            seed: Some(7),
            metrics: false,
        };
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        play(ViruslabConfig::default(), args, Arc::clone(&metrics))
            .await
            .unwrap();
        let dump = metrics.gather_metrics().unwrap();
        assert!(dump.contains("deploy_bot"));
        assert!(dump.contains("remove_bot"));
    }

    #[tokio::test(start_paused = true)]
    async fn connected_session_exits_cleanly() {
        let args = PlayArgs {
            connect: Some("0xFEED".into()),
            duration_secs: 4,
            deploy: 2,
            recall: 0,
            exit: true,
            seed: Some(7),
            metrics: false,
        };
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        play(ViruslabConfig::default(), args, Arc::clone(&metrics))
            .await
            .unwrap();
        assert!(metrics.gather_metrics().unwrap().contains("exit_game"));
    }
}
