use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine task has stopped")]
    Stopped,

    #[error("Command not supported by this engine: {0}")]
    Unsupported(&'static str),

    #[error("Engine task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::Join(err.to_string())
    }
}
