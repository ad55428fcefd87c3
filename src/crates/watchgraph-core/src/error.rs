//! Error types for graph construction and execution
//!
//! This module defines all error types that can occur while wiring a dialogue graph
//! and while driving a thread through it. All errors implement `std::error::Error`
//! via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! GraphError
//! ├── ThreadNotFound      - Resume addressed an unknown thread id
//! ├── NoPendingInterrupt  - Resume addressed a completed or failed thread
//! ├── ThreadBusy          - A second resume raced an in-flight execution
//! ├── Routing             - Conditional edge chose an unregistered step (fatal)
//! ├── Configuration       - Graph wiring rejected at compile time
//! ├── Upstream            - Collaborator failure inside a step (retryable)
//! ├── Checkpoint          - Persistence errors
//! └── Serialization       - JSON errors
//! ```
//!
//! # Retryability
//!
//! `Upstream` failures leave the last persisted checkpoint untouched, still naming
//! the step that failed, so the caller may repeat the same resume once the
//! collaborator recovers. `Routing` and
//! `Configuration` are defects in the wiring, not transient conditions; the engine
//! marks the thread `Failed` for routing defects and refuses to compile for
//! configuration defects.

use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur during graph construction and execution
#[derive(Error, Debug)]
pub enum GraphError {
    /// No checkpoint exists for the addressed thread
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// The thread exists but is terminal; nothing to answer or re-enter
    #[error("Thread '{thread_id}' has no pending question (status: {status})")]
    NoPendingInterrupt {
        /// Thread that was addressed
        thread_id: String,
        /// Status the thread was actually in
        status: String,
    },

    /// Another execution already holds this thread
    #[error("Thread '{0}' is already executing")]
    ThreadBusy(String),

    /// A conditional edge selected a step the graph does not know
    #[error("Routing error at step '{from}': selected unregistered step '{selected}'")]
    Routing {
        /// Step whose conditional edge misbehaved
        from: String,
        /// The unregistered selection
        selected: String,
    },

    /// Graph wiring rejected at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A collaborator (model, search, catalog) failed inside a step
    #[error("Upstream failure in step '{step}': {message}")]
    Upstream {
        /// Step that was executing
        step: String,
        /// What the collaborator reported
        message: String,
    },

    /// Persistence error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] watchgraph_checkpoint::CheckpointError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an upstream error for a step
    pub fn upstream(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Create a routing error
    pub fn routing(from: impl Into<String>, selected: impl Into<String>) -> Self {
        Self::Routing {
            from: from.into(),
            selected: selected.into(),
        }
    }

    /// True when retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GraphError::Upstream { .. } | GraphError::Checkpoint(_) | GraphError::ThreadBusy(_)
        )
    }
}
