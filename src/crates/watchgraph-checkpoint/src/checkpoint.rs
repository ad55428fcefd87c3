//! Checkpoint data structures
//!
//! This module defines **[`Checkpoint`]** and **[`ThreadStatus`]** - the durable record of a
//! conversation thread and the explicit lifecycle value that replaces exception-style
//! interrupt signalling.
//!
//! # Overview
//!
//! A checkpoint is the single source of truth for one thread:
//!
//! - **One live record per thread** - every `put` for a thread id replaces the previous record
//! - **Opaque state** - the engine's typed state is stored as `serde_json::Value`, so storage
//!   backends never depend on the application's state type
//! - **Explicit status** - a pending question is data (`WaitingForInput`), not a raised signal
//! - **Re-entry pointer** - both non-terminal statuses record which step runs next, so a run
//!   cut short by a collaborator failure can be re-entered instead of abandoned
//! - **Audit fields** - `step_count` and `updated_at` track progress without storing history
//!
//! # Thread Lifecycle
//!
//! ```text
//! start ──► Running { step } ──► WaitingForInput { step, prompt } ──► Running { step } ──► ...
//!                   │                                                        │
//!                   │                                                        ▼
//!                   └──► Failed { error }   (fatal wiring defects only)  Completed
//! ```
//!
//! A resume is legal from `WaitingForInput` (answering the pending question) and from
//! `Running` (re-entering the recorded step after an interrupted run); resuming a terminal
//! thread is a protocol violation surfaced by the engine, not by this crate.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use watchgraph_checkpoint::{Checkpoint, ThreadStatus};
//! use serde_json::json;
//!
//! let cp = Checkpoint::new(
//!     "thread-1".to_string(),
//!     json!({"mood": []}),
//!     ThreadStatus::Running { step: json!("ask_mood") },
//! );
//! assert_eq!(cp.step_count, 0);
//!
//! let cp = cp.advanced(json!({"mood": ["cozy"]}), ThreadStatus::Completed);
//! assert_eq!(cp.step_count, 1);
//! ```
//!
//! # See Also
//!
//! - [`CheckpointSaver`](crate::traits::CheckpointSaver) - Storage trait for these records
//! - [`InMemoryCheckpointSaver`](crate::memory::InMemoryCheckpointSaver) - Reference backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a conversation thread.
///
/// Both non-terminal variants carry a serialized step identifier, so a resume can
/// re-enter the right step without the storage layer knowing the application's
/// step enum: `WaitingForInput` re-enters the step that asked the pending
/// question, `Running` re-enters the step the interrupted run was about to
/// execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThreadStatus {
    /// Thread is mid-run; no question pending. `step` is the next step to
    /// execute, which is where a resume re-enters if the run was cut short by a
    /// collaborator failure.
    Running {
        /// Serialized identifier of the next step to execute.
        step: serde_json::Value,
    },
    /// Thread paused on a question; `step` re-enters on resume.
    WaitingForInput {
        /// Serialized step identifier (the application's closed step enum).
        step: serde_json::Value,
        /// Question text awaiting an answer.
        prompt: String,
    },
    /// Terminal: the graph reached its finish step.
    Completed,
    /// Terminal: a fatal wiring defect stopped the run.
    Failed {
        /// Human-readable description of the defect.
        error: String,
    },
}

impl ThreadStatus {
    /// True for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ThreadStatus::Completed | ThreadStatus::Failed { .. })
    }

    /// True when a question is pending.
    pub fn is_waiting(&self) -> bool {
        matches!(self, ThreadStatus::WaitingForInput { .. })
    }
}

/// The single durable record for one conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Opaque thread identifier (assigned by the engine at start).
    pub thread_id: String,
    /// Serialized conversation state.
    pub state: serde_json::Value,
    /// Current lifecycle status.
    pub status: ThreadStatus,
    /// Number of step executions persisted so far.
    pub step_count: u64,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create the first checkpoint for a thread.
    pub fn new(thread_id: String, state: serde_json::Value, status: ThreadStatus) -> Self {
        Self {
            thread_id,
            state,
            status,
            step_count: 0,
            updated_at: Utc::now(),
        }
    }

    /// Produce the successor record after one step execution.
    pub fn advanced(&self, state: serde_json::Value, status: ThreadStatus) -> Self {
        Self {
            thread_id: self.thread_id.clone(),
            state,
            status,
            step_count: self.step_count + 1,
            updated_at: Utc::now(),
        }
    }
}
