//! Single-task actor owning a [`LedgerMirror`].
//!
//! Four timers (poll, visual accrual, drama, deferred reverts), the event
//! subscription and the command mailbox all feed one `select!` loop, so every
//! callback is applied to the mirror in isolation. Reads and submissions run
//! as child tasks and report back through the same loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info_span, trace, warn, Instrument};

use viruslab_config::LedgerConfig;
use viruslab_core::ledger::{
    Identity, Ledger, LedgerCommand, LedgerError, LedgerEvent, PlayerState, Submission, TxHash,
};
use viruslab_core::{EngineError, EngineState, GameEngine};
use viruslab_telemetry::{EventLogger, MetricsRecorder};

use super::mirror::{LedgerMirror, LedgerTimer};
use crate::handle::{Command, EngineHandle, COMMAND_BUFFER};
use crate::schedule::Timers;

const ENGINE_LABEL: &str = "ledger";

/// Engine mirroring one connected identity's on-ledger state.
pub struct LedgerEngine {
    identity: Identity,
    handle: EngineHandle,
}

impl LedgerEngine {
    /// Subscribes to ledger events and spawns the actor on the current
    /// tokio runtime. The first player-state read is issued immediately.
    pub fn spawn(
        config: LedgerConfig,
        identity: Identity,
        ledger: Arc<dyn Ledger>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let events = ledger.subscribe();
        let intervals = Intervals::new(&config);
        let deploy = LedgerCommand::DeployUnit {
            quantity: config.deploy_quantity,
            attached_value: u128::from(config.deploy_value_wei),
        };
        let mirror = LedgerMirror::new(config, identity.clone());

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(mirror.snapshot());

        let actor = LedgerActor {
            mirror,
            rng,
            ledger,
            deploy,
            commands: command_rx,
            state: state_tx,
            events,
            events_open: true,
            intervals,
            tasks: Timers::new(),
            next_seq: 0,
            read_in_flight: false,
            refetch_queued: false,
            metrics,
        };
        let span = info_span!("ledger_engine", identity = %identity);
        let task = tokio::spawn(actor.run().instrument(span));

        Self {
            identity,
            handle: EngineHandle::new(command_tx, state_rx, task),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.handle.subscribe()
    }

    /// Cancels every timer and unsubscribes from the ledger.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        self.handle.shutdown().await
    }
}

#[async_trait]
impl GameEngine for LedgerEngine {
    fn snapshot(&self) -> EngineState {
        self.handle.snapshot()
    }

    async fn deploy_bot(&self) -> Result<(), EngineError> {
        self.handle.send(Command::DeployBot).await
    }

    async fn remove_bot(&self) -> Result<(), EngineError> {
        self.handle.send(Command::RemoveBot).await
    }

    async fn exit_game(&self) -> Result<(), EngineError> {
        self.handle.send(Command::ExitGame).await
    }
}

struct Intervals {
    poll: Interval,
    accrual: Interval,
    drama: Interval,
}

impl Intervals {
    fn new(config: &LedgerConfig) -> Self {
        // Polling starts right away; the cosmetic loops wait one period.
        let mut poll = interval(Duration::from_millis(config.poll_interval_ms));
        let mut accrual = delayed(Duration::from_millis(config.accrual_interval_ms));
        let mut drama = delayed(Duration::from_millis(config.drama_interval_ms));
        for ticker in [&mut poll, &mut accrual, &mut drama] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }
        Self {
            poll,
            accrual,
            drama,
        }
    }
}

fn delayed(period: Duration) -> Interval {
    interval_at(Instant::now() + period, period)
}

/// Results coming back from child tasks.
enum Deferred {
    Timer(LedgerTimer),
    Polled {
        seq: u64,
        elapsed: Duration,
        result: Result<Option<PlayerState>, LedgerError>,
    },
    Submitted {
        command: LedgerCommand,
        result: Result<Submission, LedgerError>,
    },
    Confirmed {
        command: LedgerCommand,
        tx_hash: TxHash,
        outcome: Result<Result<(), LedgerError>, oneshot::error::RecvError>,
    },
}

struct LedgerActor {
    mirror: LedgerMirror,
    rng: SmallRng,
    ledger: Arc<dyn Ledger>,
    deploy: LedgerCommand,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<EngineState>,
    events: broadcast::Receiver<Vec<LedgerEvent>>,
    events_open: bool,
    intervals: Intervals,
    tasks: Timers<Deferred>,
    next_seq: u64,
    read_in_flight: bool,
    refetch_queued: bool,
    metrics: Arc<MetricsRecorder>,
}

impl LedgerActor {
    async fn run(mut self) {
        debug!("ledger engine started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = self.intervals.poll.tick() => self.poll(),
                _ = self.intervals.accrual.tick() => self.mirror.accrue(),
                _ = self.intervals.drama.tick() => {
                    self.metrics.inc_tick(ENGINE_LABEL);
                    let scheduled = self.mirror.drama(&mut self.rng);
                    self.tasks.schedule_all(scheduled.into_iter().map(|s| s.map(Deferred::Timer)));
                }
                batch = self.events.recv(), if self.events_open => self.handle_batch(batch),
                Some(done) = self.tasks.next(), if !self.tasks.is_empty() => {
                    self.handle_deferred(done).await;
                }
            }
            self.state.send_replace(self.mirror.snapshot());
        }
        self.tasks.abort_all();
        debug!("ledger engine stopped");
    }

    fn handle_command(&mut self, command: Command) {
        self.metrics.inc_command(command.name());
        let submission = match command {
            Command::DeployBot => self.deploy,
            Command::RemoveBot => LedgerCommand::RecallOperation,
            Command::ExitGame => LedgerCommand::ExitProtocol,
            Command::SetActive(_) | Command::Shutdown => {
                debug!(command = command.name(), "ignored by ledger engine");
                return;
            }
        };
        self.submit(submission);
    }

    /// Phase one: log intent and hand the command to the collaborator.
    fn submit(&mut self, command: LedgerCommand) {
        self.mirror.command_initiated(&command);
        let ledger = Arc::clone(&self.ledger);
        let identity = self.mirror.identity().clone();
        self.tasks.spawn(async move {
            let result = ledger.submit(&identity, command).await;
            Deferred::Submitted { command, result }
        });
    }

    /// Periodic read. Skipped while the previous one is outstanding.
    fn poll(&mut self) {
        if self.read_in_flight {
            trace!("poll skipped, read still in flight");
            return;
        }
        self.issue_read();
    }

    /// On-demand read after a confirmation. A read already in flight may
    /// predate the confirmed block, so another one is queued behind it.
    fn refetch(&mut self) {
        if self.read_in_flight {
            self.refetch_queued = true;
        } else {
            self.issue_read();
        }
    }

    /// Issues a numbered player-state read.
    fn issue_read(&mut self) {
        self.read_in_flight = true;
        self.next_seq += 1;
        let seq = self.next_seq;
        let ledger = Arc::clone(&self.ledger);
        let identity = self.mirror.identity().clone();
        trace!(seq, "player state read issued");
        self.tasks.spawn(async move {
            let started = Instant::now();
            let result = ledger.player_state(&identity).await;
            Deferred::Polled {
                seq,
                elapsed: started.elapsed(),
                result,
            }
        });
    }

    fn handle_batch(&mut self, batch: Result<Vec<LedgerEvent>, RecvError>) {
        match batch {
            Ok(events) => {
                let relevant = events.iter().filter(|e| self.mirror.concerns(e)).count();
                if relevant == 0 {
                    return;
                }
                self.metrics.ledger_events.inc_by(relevant as u64);
                debug!(relevant, "ledger events received");
                let scheduled = self.mirror.apply_events(&events);
                self.tasks.schedule_all(scheduled.into_iter().map(|s| s.map(Deferred::Timer)));
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "ledger event subscription lagged");
            }
            Err(RecvError::Closed) => {
                warn!("ledger event subscription closed");
                self.events_open = false;
            }
        }
    }

    async fn handle_deferred(&mut self, done: Deferred) {
        match done {
            Deferred::Timer(timer) => self.mirror.fire(timer),
            Deferred::Polled {
                seq,
                elapsed,
                result,
            } => {
                self.read_in_flight = false;
                self.metrics.poll_latency.observe(elapsed.as_secs_f64());
                match result {
                    Ok(state) => {
                        if !self.mirror.apply_player_state(seq, state) {
                            trace!(seq, "stale player state dropped");
                        }
                    }
                    Err(err) => warn!(seq, "player state read failed: {err}"),
                }
                if std::mem::take(&mut self.refetch_queued) {
                    self.issue_read();
                }
            }
            Deferred::Submitted { command, result } => {
                self.mirror
                    .command_submitted(&command, result.as_ref().map(|s| &s.tx_hash));
                match result {
                    Ok(Submission {
                        tx_hash,
                        confirmation,
                    }) => {
                        EventLogger::log_event(
                            "command_submitted",
                            vec![
                                KeyValue::new("command", command.name()),
                                KeyValue::new("tx_hash", tx_hash.to_string()),
                            ],
                        )
                        .await;
                        // Phase two: wait for inclusion without blocking the loop.
                        self.tasks.spawn(async move {
                            let outcome = confirmation.await;
                            Deferred::Confirmed {
                                command,
                                tx_hash,
                                outcome,
                            }
                        });
                    }
                    Err(err) => {
                        EventLogger::log_event(
                            "command_rejected",
                            vec![
                                KeyValue::new("command", command.name()),
                                KeyValue::new("error", err.to_string()),
                            ],
                        )
                        .await;
                    }
                }
            }
            Deferred::Confirmed {
                command,
                tx_hash,
                outcome,
            } => match outcome {
                Ok(Ok(())) => {
                    EventLogger::log_event(
                        "command_confirmed",
                        vec![
                            KeyValue::new("command", command.name()),
                            KeyValue::new("tx_hash", tx_hash.to_string()),
                        ],
                    )
                    .await;
                    self.refetch();
                }
                Ok(Err(err)) => warn!(%tx_hash, command = command.name(), "transaction reverted: {err}"),
                Err(_) => warn!(%tx_hash, command = command.name(), "transaction dropped without confirmation"),
            },
        }
    }
}
