//! Conversation state for the recommendation dialogue
//!
//! [`RecommenderState`] accumulates what the interview learns; [`StateUpdate`] is
//! the patch type steps return. Every field merge is overwrite-if-present except
//! `asked_nostalgic`, which is logical-OR so the one-shot nostalgic fallback can
//! never be re-armed by a later patch.

use serde::{Deserialize, Serialize};
use watchgraph_core::GraphState;

use crate::providers::MediaMatch;

/// Everything the dialogue knows about the couple's evening so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommenderState {
    /// Moods given in the first answer, split and trimmed.
    pub mood: Vec<String>,
    /// Raw trimmed answer to the movie/series/both question.
    pub media_type: Option<String>,
    /// Genre preferences; empty means no preference.
    pub genres: Vec<String>,
    /// Beloved past title offered when search came up short.
    pub nostalgic_title: Option<String>,
    /// Latest watch-history matches; overwritten by every search.
    pub search_results: Vec<MediaMatch>,
    /// Whether the nostalgic fallback question was already asked.
    pub asked_nostalgic: bool,
    /// Joined availability tool results, set by the availability step.
    pub availability_info: Option<String>,
    /// Final formatted recommendation; set only by the last step.
    pub recommendation: Option<String>,
}

/// Partial update produced by one step.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub mood: Option<Vec<String>>,
    pub media_type: Option<String>,
    pub genres: Option<Vec<String>>,
    pub nostalgic_title: Option<String>,
    pub search_results: Option<Vec<MediaMatch>>,
    pub asked_nostalgic: Option<bool>,
    pub availability_info: Option<String>,
    pub recommendation: Option<String>,
}

impl GraphState for RecommenderState {
    type Patch = StateUpdate;

    fn apply(&mut self, patch: StateUpdate) {
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
        if let Some(media_type) = patch.media_type {
            self.media_type = Some(media_type);
        }
        if let Some(genres) = patch.genres {
            self.genres = genres;
        }
        if let Some(title) = patch.nostalgic_title {
            self.nostalgic_title = Some(title);
        }
        if let Some(results) = patch.search_results {
            self.search_results = results;
        }
        if let Some(asked) = patch.asked_nostalgic {
            // Monotonic: once asked, stays asked.
            self.asked_nostalgic = self.asked_nostalgic || asked;
        }
        if let Some(info) = patch.availability_info {
            self.availability_info = Some(info);
        }
        if let Some(text) = patch.recommendation {
            self.recommendation = Some(text);
        }
    }
}
