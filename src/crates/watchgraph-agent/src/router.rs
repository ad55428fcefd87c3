//! Step identifiers and the post-search router
//!
//! [`StepId`] is the closed set of dialogue steps; the graph builder validates
//! every edge against it at compile time. [`route_after_search`] is the single
//! conditional decision in the dialogue: either the search found enough signal to
//! recommend, or we get one chance to ask for a nostalgic reference. Because the
//! nostalgic step sets `asked_nostalgic` unconditionally, the search can loop back
//! through it at most once.

use serde::{Deserialize, Serialize};

use crate::state::RecommenderState;

/// The steps of the recommendation dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Ask for tonight's moods.
    AskMood,
    /// Ask movie, series, or both.
    AskMediaType,
    /// Ask for genre preferences.
    AskGenres,
    /// Semantic search over the watch history.
    SearchLibrary,
    /// Fallback: ask for a beloved past title.
    AskNostalgic,
    /// Verify streaming availability of the candidates.
    CheckAvailability,
    /// Produce the final formatted recommendation.
    Recommend,
}

/// Decide where to go after a search pass.
///
/// Proceed to availability checking when the search produced at least
/// `min_matches` results, or when the nostalgic question was already spent;
/// otherwise ask it now.
pub fn route_after_search(state: &RecommenderState, min_matches: usize) -> StepId {
    if state.search_results.len() >= min_matches || state.asked_nostalgic {
        StepId::CheckAvailability
    } else {
        StepId::AskNostalgic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MediaMatch;

    fn with_results(n: usize, asked: bool) -> RecommenderState {
        RecommenderState {
            search_results: (0..n)
                .map(|i| MediaMatch {
                    title: format!("Title {i}"),
                    media_type: "movie".to_string(),
                    user_rating: None,
                    user_review: String::new(),
                    partner_review: String::new(),
                })
                .collect(),
            asked_nostalgic: asked,
            ..Default::default()
        }
    }

    #[test]
    fn test_enough_results_proceeds() {
        assert_eq!(route_after_search(&with_results(2, false), 2), StepId::CheckAvailability);
        assert_eq!(route_after_search(&with_results(3, false), 2), StepId::CheckAvailability);
    }

    #[test]
    fn test_thin_results_ask_nostalgic_once() {
        assert_eq!(route_after_search(&with_results(0, false), 2), StepId::AskNostalgic);
        assert_eq!(route_after_search(&with_results(1, false), 2), StepId::AskNostalgic);
    }

    #[test]
    fn test_already_asked_always_proceeds() {
        assert_eq!(route_after_search(&with_results(0, true), 2), StepId::CheckAvailability);
        assert_eq!(route_after_search(&with_results(1, true), 2), StepId::CheckAvailability);
    }

    #[test]
    fn test_step_id_serde_is_snake_case() {
        let encoded = serde_json::to_string(&StepId::CheckAvailability).unwrap();
        assert_eq!(encoded, "\"check_availability\"");
        let back: StepId = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, StepId::CheckAvailability);
    }
}
