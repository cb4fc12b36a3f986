//! Core error types

use thiserror::Error;

/// Errors raised while building particle objects and contexts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A constructor or setter received a value outside its domain
    #[error("Invalid value: {0}")]
    Validation(String),
}

impl CoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
