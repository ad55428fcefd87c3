//! In-memory checkpoint storage for development and testing
//!
//! This module provides **[`InMemoryCheckpointSaver`]** - a reference implementation of the
//! [`CheckpointSaver`] trait backed by a thread-safe HashMap. One entry per thread id; each
//! `put` replaces the previous record.
//!
//! # Overview
//!
//! - **No External Dependencies** - Pure Rust, no database required
//! - **Thread-Safe** - `Arc<RwLock<HashMap>>` for concurrent access
//! - **Ephemeral** - Data lost on application restart
//! - **Testing-Friendly** - Includes `clear()` for test isolation
//!
//! # When to Use
//!
//! Development, tests, demos, and single-process deployments where conversations may be
//! lost on restart. For durability, implement [`CheckpointSaver`] over your own backend;
//! application code stays the same.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use watchgraph_checkpoint::{Checkpoint, CheckpointSaver, InMemoryCheckpointSaver, ThreadStatus};
//! use serde_json::json;
//!
//! let saver = InMemoryCheckpointSaver::new();
//! let status = ThreadStatus::Running { step: json!("ask_mood") };
//! let cp = Checkpoint::new("t1".to_string(), json!({}), status);
//! saver.put(cp).await?;
//! assert!(saver.get("t1").await?.is_some());
//! ```
//!
//! # See Also
//!
//! - [`CheckpointSaver`](crate::traits::CheckpointSaver) - Trait this implements
//! - [`Checkpoint`](crate::checkpoint::Checkpoint) - Stored record

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::traits::CheckpointSaver;

/// Thread-safe in-memory checkpoint storage, one record per thread id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointSaver {
    storage: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl InMemoryCheckpointSaver {
    /// Create a new in-memory checkpoint saver
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of threads being tracked
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Clear all checkpoints (useful for testing)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl CheckpointSaver for InMemoryCheckpointSaver {
    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut storage = self.storage.write().await;
        storage.insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let storage = self.storage.read().await;
        Ok(storage.get(thread_id).cloned())
    }

    async fn delete(&self, thread_id: &str) -> Result<()> {
        let mut storage = self.storage.write().await;
        storage.remove(thread_id);
        Ok(())
    }
}
