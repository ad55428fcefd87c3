//! Checkpoint storage trait
//!
//! **[`CheckpointSaver`]** is the seam between the graph engine and durable storage.
//! The engine only ever needs three operations: replace the record for a thread, fetch
//! the latest record, and drop a thread entirely. Backends (in-memory, SQL, Redis)
//! implement this trait; the engine holds an `Arc<dyn CheckpointSaver>` and never
//! knows which one it got.

use async_trait::async_trait;

use crate::checkpoint::Checkpoint;
use crate::error::Result;

/// Storage backend for conversation checkpoints.
///
/// Implementations must be safe for concurrent use; the engine may call `put` and
/// `get` for different threads at the same time.
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Store the record for a thread, replacing any previous record.
    async fn put(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Fetch the current record for a thread, if one exists.
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove a thread's record. Removing an unknown thread is not an error.
    async fn delete(&self, _thread_id: &str) -> Result<()> {
        Ok(())
    }
}
