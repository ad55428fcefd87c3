//! Collaborator traits
//!
//! The agent consumes two external capabilities through dependency-injected trait
//! objects: semantic search over the couple's watch history, and a title catalog
//! with regional streaming availability. Implementations live outside this crate
//! (a vector store, a metadata API); tests inject fixtures.
//!
//! Provider failures are transport-level only. "Nothing matched" is an empty
//! result list, not an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error reported by a provider implementation.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    /// Create a provider error
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// One watch-history entry returned by semantic search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMatch {
    /// Title as recorded in the watch history.
    pub title: String,
    /// "movie" or "series".
    pub media_type: String,
    /// Rating out of 10, if the couple rated it.
    pub user_rating: Option<u8>,
    /// First partner's review text.
    #[serde(default)]
    pub user_review: String,
    /// Second partner's review text.
    #[serde(default)]
    pub partner_review: String,
}

/// A catalog candidate for a title lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog-internal identifier.
    pub id: i64,
    /// Canonical title.
    pub title: String,
    /// "movie" or "series".
    pub media_type: String,
}

/// Semantic search over the couple's watch history.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return the closest matches for a free-text query, best first.
    async fn search(&self, query: &str, limit: usize) -> ProviderResult<Vec<MediaMatch>>;
}

/// Title catalog with regional streaming availability.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Find catalog candidates for a title, best first.
    async fn find_title(&self, name: &str) -> ProviderResult<Vec<CatalogEntry>>;

    /// Map region code to the platform names streaming the title there.
    async fn availability(
        &self,
        id: i64,
        media_type: &str,
    ) -> ProviderResult<HashMap<String, Vec<String>>>;
}
