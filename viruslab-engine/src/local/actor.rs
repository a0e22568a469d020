//! Single-task actor owning a [`LocalSimulation`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info_span, trace, Instrument};

use viruslab_config::LocalConfig;
use viruslab_core::{EngineError, EngineState, GameEngine};
use viruslab_telemetry::MetricsRecorder;

use super::simulation::{LocalSimulation, LocalTimer};
use crate::handle::{Command, EngineHandle, COMMAND_BUFFER};
use crate::schedule::Timers;

const ENGINE_LABEL: &str = "local";

/// Offline engine. Ticks only while active.
pub struct LocalEngine {
    handle: EngineHandle,
}

impl LocalEngine {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(config: LocalConfig, active: bool, metrics: Arc<MetricsRecorder>) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let period = Duration::from_millis(config.tick_interval_ms);
        let sim = LocalSimulation::new(config);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(sim.snapshot());

        let actor = LocalActor {
            sim,
            rng,
            active,
            period,
            ticker: ticker(period),
            commands: command_rx,
            state: state_tx,
            timers: Timers::new(),
            metrics,
        };
        let task = tokio::spawn(actor.run().instrument(info_span!("local_engine")));

        Self {
            handle: EngineHandle::new(command_tx, state_rx, task),
        }
    }

    /// Gates the main loop. Re-activation restarts the tick period.
    pub async fn set_active(&self, active: bool) -> Result<(), EngineError> {
        self.handle.send(Command::SetActive(active)).await
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.handle.subscribe()
    }

    pub async fn shutdown(self) -> Result<(), EngineError> {
        self.handle.shutdown().await
    }
}

#[async_trait]
impl GameEngine for LocalEngine {
    fn snapshot(&self) -> EngineState {
        self.handle.snapshot()
    }

    async fn deploy_bot(&self) -> Result<(), EngineError> {
        self.handle.send(Command::DeployBot).await
    }

    async fn remove_bot(&self) -> Result<(), EngineError> {
        self.handle.send(Command::RemoveBot).await
    }
}

fn ticker(period: Duration) -> Interval {
    // First tick one full period after start, like a browser interval.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

struct LocalActor {
    sim: LocalSimulation,
    rng: SmallRng,
    active: bool,
    period: Duration,
    ticker: Interval,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<EngineState>,
    timers: Timers<LocalTimer>,
    metrics: Arc<MetricsRecorder>,
}

impl LocalActor {
    async fn run(mut self) {
        debug!(active = self.active, "local engine started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = self.ticker.tick(), if self.active => {
                    self.metrics.inc_tick(ENGINE_LABEL);
                    let scheduled = self.sim.tick(&mut self.rng);
                    trace!(bots = self.sim.bots(), money = self.sim.money(), "tick");
                    self.timers.schedule_all(scheduled);
                }
                Some(timer) = self.timers.next(), if !self.timers.is_empty() => {
                    trace!(?timer, "timer fired");
                    self.sim.fire(timer, &mut self.rng);
                }
            }
            self.state.send_replace(self.sim.snapshot());
        }
        self.timers.abort_all();
        debug!("local engine stopped");
    }

    fn handle_command(&mut self, command: Command) {
        self.metrics.inc_command(command.name());
        match command {
            Command::DeployBot => {
                let scheduled = self.sim.deploy_bot();
                self.timers.schedule_all(scheduled);
            }
            Command::RemoveBot => self.sim.remove_bot(),
            Command::SetActive(active) => {
                if active && !self.active {
                    self.ticker = ticker(self.period);
                }
                if !active && self.active {
                    // Pending effects belong to the session being suspended.
                    self.timers.reset();
                    self.sim.suspend();
                }
                debug!(active, "local engine activity changed");
                self.active = active;
            }
            Command::ExitGame | Command::Shutdown => {
                debug!(command = command.name(), "ignored by local engine");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;
    use viruslab_core::{LogKind, VirusStatus};

    fn metrics() -> Arc<MetricsRecorder> {
        Arc::new(MetricsRecorder::new().unwrap())
    }

    fn quiet_config() -> LocalConfig {
        LocalConfig {
            attack_visual_probability: 0.0,
            mutation_probability: 0.0,
            flavor_threshold: 1.0,
            seed: Some(1),
            ..LocalConfig::default()
        }
    }

    /// Lets the actor drain its mailbox.
    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_engine_does_not_tick() {
        let engine = LocalEngine::spawn(quiet_config(), false, metrics());
        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(engine.snapshot().money, 500.0);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn active_engine_ticks_every_two_seconds() {
        let engine = LocalEngine::spawn(quiet_config(), true, metrics());
        sleep(Duration::from_millis(1_999)).await;
        assert_eq!(engine.snapshot().money, 500.0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(engine.snapshot().money, 500.5);
        sleep(Duration::from_millis(4_000)).await;
        assert_eq!(engine.snapshot().money, 501.5);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_pulse_clears_after_half_a_second() {
        let engine = LocalEngine::spawn(quiet_config(), false, metrics());
        engine.deploy_bot().await.unwrap();
        settle().await;

        let state = engine.snapshot();
        assert_eq!(state.bots, 2);
        assert_eq!(state.money, 400.0);
        assert!(state.attack_visual);
        assert_eq!(state.logs.last().unwrap().kind, LogKind::Success);

        sleep(Duration::from_millis(500)).await;
        assert!(!engine.snapshot().attack_visual);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_reverts_to_stable_after_delay() {
        let config = LocalConfig {
            mutation_probability: 1.0,
            unit_loss_probability: 0.0,
            ..quiet_config()
        };
        let engine = LocalEngine::spawn(config, true, metrics());
        sleep(Duration::from_millis(2_001)).await;
        assert_eq!(engine.snapshot().status, VirusStatus::Mutating);

        sleep(Duration::from_millis(3_000)).await;
        let state = engine.snapshot();
        assert_eq!(state.status, VirusStatus::Stable);
        assert_eq!(state.logs.last().unwrap().kind, LogKind::Success);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn suspending_cancels_pending_effects() {
        let config = LocalConfig {
            mutation_probability: 1.0,
            attack_visual_probability: 1.0,
            unit_loss_probability: 1.0,
            ..quiet_config()
        };
        let engine = LocalEngine::spawn(config, true, metrics());
        sleep(Duration::from_millis(2_001)).await;
        let state = engine.snapshot();
        assert_eq!(state.status, VirusStatus::Mutating);
        assert!(state.attack_visual);

        engine.set_active(false).await.unwrap();
        settle().await;
        let suspended = engine.snapshot();
        assert_eq!(suspended.status, VirusStatus::Stable);
        assert!(!suspended.attack_visual);
        assert_eq!(suspended.bots, 1);

        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(engine.snapshot(), suspended);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn recall_with_no_bots_is_silent() {
        let config = LocalConfig {
            initial_bots: 0,
            ..quiet_config()
        };
        let engine = LocalEngine::spawn(config, false, metrics());
        engine.remove_bot().await.unwrap();
        settle().await;
        assert!(engine.snapshot().logs.is_empty());
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exit_is_unsupported_locally() {
        let engine = LocalEngine::spawn(quiet_config(), false, metrics());
        assert!(matches!(
            engine.exit_game().await,
            Err(EngineError::Unsupported("exit_game"))
        ));
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_state_feed() {
        let engine = LocalEngine::spawn(quiet_config(), true, metrics());
        let mut state = engine.subscribe();
        engine.shutdown().await.unwrap();
        assert!(state.changed().await.is_err());
    }
}
