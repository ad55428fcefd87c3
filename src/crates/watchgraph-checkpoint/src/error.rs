//! Error types for checkpoint operations
//!
//! The in-memory backend only ever produces `Serialization`; `Storage` and
//! `Invalid` (with their helper constructors) exist for external
//! [`CheckpointSaver`](crate::traits::CheckpointSaver) implementations, which
//! report backend failures and corrupt records through this type rather than
//! defining their own.

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid checkpoint
    #[error("Invalid checkpoint: {0}")]
    Invalid(String),
}

impl CheckpointError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid-checkpoint error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
