//! Chooses which engine backs the presentation layer.
//!
//! The local engine lives for the whole session and is only suspended while a
//! wallet is connected. A ledger engine exists per connected identity and is
//! torn down, subscriptions and timers included, on disconnect.

use std::sync::Arc;

use opentelemetry::KeyValue;
use tokio::sync::watch;
use tracing::{debug, instrument};

use viruslab_config::{LedgerConfig, ViruslabConfig};
use viruslab_core::connection::ConnectionStatus;
use viruslab_core::ledger::{Identity, Ledger};
use viruslab_core::{EngineError, EngineState, GameEngine};
use viruslab_telemetry::{EventLogger, MetricsRecorder};

use crate::ledger::LedgerEngine;
use crate::local::LocalEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Local,
    Ledger,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Local => "local",
            EngineKind::Ledger => "ledger",
        }
    }
}

pub struct EngineSelector {
    ledger_config: LedgerConfig,
    ledger: Arc<dyn Ledger>,
    metrics: Arc<MetricsRecorder>,
    local: LocalEngine,
    remote: Option<LedgerEngine>,
    intro_finished: bool,
    connection: ConnectionStatus,
}

impl EngineSelector {
    /// Starts the session with a suspended local engine and no connection.
    pub fn new(
        config: &ViruslabConfig,
        ledger: Arc<dyn Ledger>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let local = LocalEngine::spawn(config.local.clone(), false, Arc::clone(&metrics));
        Self {
            ledger_config: config.ledger.clone(),
            ledger,
            metrics,
            local,
            remote: None,
            intro_finished: false,
            connection: ConnectionStatus::Disconnected,
        }
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn active_kind(&self) -> EngineKind {
        if self.remote.is_some() {
            EngineKind::Ledger
        } else {
            EngineKind::Local
        }
    }

    /// The engine whose state and commands the UI should use.
    pub fn active(&self) -> &dyn GameEngine {
        match &self.remote {
            Some(remote) => remote as &dyn GameEngine,
            None => &self.local,
        }
    }

    /// Change feed of the active engine. Re-subscribe after switching.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        match &self.remote {
            Some(remote) => remote.subscribe(),
            None => self.local.subscribe(),
        }
    }

    pub fn local(&self) -> &LocalEngine {
        &self.local
    }

    pub fn ledger_engine(&self) -> Option<&LedgerEngine> {
        self.remote.as_ref()
    }

    pub async fn set_intro_finished(&mut self, finished: bool) -> Result<(), EngineError> {
        self.intro_finished = finished;
        self.sync_local().await
    }

    /// Applies a new connection signal. Reconnecting with the same identity
    /// keeps the running ledger engine.
    #[instrument(skip(self), fields(from = self.active_kind().as_str()))]
    pub async fn set_connection(&mut self, status: ConnectionStatus) -> Result<(), EngineError> {
        let same_identity = match (&self.remote, status.identity()) {
            (Some(remote), Some(identity)) => remote.identity() == identity,
            _ => false,
        };
        if !same_identity {
            if let Some(remote) = self.remote.take() {
                debug!(identity = %remote.identity(), "tearing down ledger engine");
                remote.shutdown().await?;
            }
            if let Some(identity) = status.identity() {
                self.remote = Some(self.spawn_remote(identity.clone()));
            }
        }
        self.connection = status;
        self.sync_local().await?;

        EventLogger::log_event(
            "engine_switch",
            vec![
                KeyValue::new("engine", self.active_kind().as_str()),
                KeyValue::new("connected", self.connection.is_connected()),
            ],
        )
        .await;
        Ok(())
    }

    /// Stops both engines. The local engine is stopped even if the ledger
    /// engine's task failed.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        let remote = match self.remote {
            Some(remote) => remote.shutdown().await,
            None => Ok(()),
        };
        self.local.shutdown().await?;
        remote
    }

    fn spawn_remote(&self, identity: Identity) -> LedgerEngine {
        LedgerEngine::spawn(
            self.ledger_config.clone(),
            identity,
            Arc::clone(&self.ledger),
            Arc::clone(&self.metrics),
        )
    }

    async fn sync_local(&self) -> Result<(), EngineError> {
        let active = self.intro_finished && !self.connection.is_connected();
        self.local.set_active(active).await
    }
}
