//! # watchgraph-checkpoint
//!
//! Durable conversation state for watchgraph: the [`Checkpoint`] record, the
//! [`ThreadStatus`] lifecycle value, the [`CheckpointSaver`] storage trait, and an
//! in-memory reference backend.
//!
//! The engine persists exactly one record per thread id. A pending question is stored
//! as data (`ThreadStatus::WaitingForInput`), which is what makes conversations
//! resumable across independent request/response cycles.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use watchgraph_checkpoint::{Checkpoint, CheckpointSaver, InMemoryCheckpointSaver, ThreadStatus};
//! use serde_json::json;
//!
//! let saver = InMemoryCheckpointSaver::new();
//! let status = ThreadStatus::Running { step: json!("ask_mood") };
//! saver.put(Checkpoint::new("t1".into(), json!({}), status)).await?;
//! let record = saver.get("t1").await?;
//! ```

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod traits;

pub use checkpoint::{Checkpoint, ThreadStatus};
pub use error::{CheckpointError, Result};
pub use memory::InMemoryCheckpointSaver;
pub use traits::CheckpointSaver;
