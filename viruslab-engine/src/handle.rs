//! Handle to a running engine actor.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use viruslab_core::{EngineError, EngineState};

pub(crate) const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    DeployBot,
    RemoveBot,
    ExitGame,
    SetActive(bool),
    Shutdown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::DeployBot => "deploy_bot",
            Command::RemoveBot => "remove_bot",
            Command::ExitGame => "exit_game",
            Command::SetActive(_) => "set_active",
            Command::Shutdown => "shutdown",
        }
    }
}

/// Command sender plus the latest published state of one actor task.
///
/// Dropping the handle aborts the task; `shutdown` stops it gracefully.
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<EngineState>,
    task: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        state: watch::Receiver<EngineState>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            state,
            task: Some(task),
        }
    }

    pub fn snapshot(&self) -> EngineState {
        self.state.borrow().clone()
    }

    /// Change feed for the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.clone()
    }

    pub(crate) async fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Stopped)
    }

    pub async fn shutdown(mut self) -> Result<(), EngineError> {
        // The task may already be gone; joining below still reports panics.
        let _ = self.commands.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
