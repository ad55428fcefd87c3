//! Watch-history search step
//!
//! Builds a free-text query from whatever the interview has gathered so far and
//! overwrites `search_results` with the provider's answer. Runs once after the
//! interview and possibly a second time after the nostalgic fallback, with the
//! nostalgic title added as one more labeled clause.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use watchgraph_core::{GraphError, Result, Step, StepContext, StepOutcome};

use crate::providers::SearchProvider;
use crate::state::{RecommenderState, StateUpdate};

/// Semantic search over the couple's watch history.
pub struct SearchLibrary {
    provider: Arc<dyn SearchProvider>,
    limit: usize,
}

impl SearchLibrary {
    /// Create the step with an injected provider and result limit
    pub fn new(provider: Arc<dyn SearchProvider>, limit: usize) -> Self {
        Self { provider, limit }
    }
}

/// Labeled clauses for present fields, joined by ". ", in fixed order.
fn build_query(state: &RecommenderState) -> String {
    let mut parts = Vec::new();

    if !state.mood.is_empty() {
        parts.push(format!("mood: {}", state.mood.join(", ")));
    }
    if let Some(media_type) = state.media_type.as_deref() {
        if !media_type.is_empty() {
            parts.push(format!("type: {media_type}"));
        }
    }
    if !state.genres.is_empty() {
        parts.push(format!("genres: {}", state.genres.join(", ")));
    }
    if let Some(title) = state.nostalgic_title.as_deref() {
        if !title.is_empty() {
            parts.push(format!("similar feel to: {title}"));
        }
    }

    parts.join(". ")
}

#[async_trait]
impl Step<RecommenderState> for SearchLibrary {
    async fn run(
        &self,
        state: &RecommenderState,
        _ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        let query = build_query(state);
        debug!(query = %query, limit = self.limit, "searching watch history");

        let results = self
            .provider
            .search(&query, self.limit)
            .await
            .map_err(|e| GraphError::upstream("search_library", e.to_string()))?;

        debug!(matches = results.len(), "search finished");
        Ok(StepOutcome::Update(StateUpdate {
            search_results: Some(results),
            ..Default::default()
        }))
    }
}
