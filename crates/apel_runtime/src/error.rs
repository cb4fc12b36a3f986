//! Error types for apel_runtime

use apel_animation::AnimationError;
use thiserror::Error;

/// Errors raised while configuring or driving a session
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Invalid or unreadable configuration
    #[error("Invalid runtime configuration: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scheduler or animator failure
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// The session was still busy after the allowed number of ticks
    #[error("Session still processing after {0} ticks")]
    TickLimit(u64),
}

impl From<anyhow::Error> for RuntimeError {
    fn from(err: anyhow::Error) -> Self {
        RuntimeError::Config(format!("{err:#}"))
    }
}

/// Result type for apel_runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
