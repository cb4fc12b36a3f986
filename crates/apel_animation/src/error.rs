//! Animation error types

use crate::scheduler::AnimatorId;
use apel_core::CoreError;
use thiserror::Error;

/// Errors raised by the scheduler and path animators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Invalid animator or step configuration
    #[error("Invalid animation configuration: {0}")]
    Validation(String),

    /// The animator already owns an active sequence
    #[error("Sequence already allocated for {0}")]
    DuplicateAllocation(AnimatorId),

    /// A step was allocated for an animator with no sequence
    #[error("No sequence allocated for {0}")]
    MissingAllocation(AnimatorId),

    /// A control action, drain watcher or animation start panicked
    #[error("Animation action panicked: {0}")]
    Panicked(String),

    /// The background draw worker could not be started
    #[error("Draw worker unavailable: {0}")]
    WorkerUnavailable(String),
}

impl AnimationError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        AnimationError::Validation(msg.into())
    }
}

impl From<CoreError> for AnimationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AnimationError::Validation(msg),
        }
    }
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
