//! Interview steps and answer parsing
//!
//! The question texts and parsing rules are fixed and deterministic. Parsing never
//! fails: empty or ambiguous answers degrade to an empty list or a raw string, and
//! the dialogue carries on with whatever it got.

use async_trait::async_trait;

use watchgraph_core::{Result, Step, StepContext, StepOutcome};

use crate::state::{RecommenderState, StateUpdate};

pub(crate) const MOOD_PROMPT: &str = "What mood are you two in tonight? \
(You can give multiple moods separated by commas, e.g. 'relaxed, adventurous')";

pub(crate) const MEDIA_TYPE_PROMPT: &str = "Are you in the mood for a movie, a series, or both?";

pub(crate) const GENRES_PROMPT: &str =
    "Any genre preferences? (e.g. thriller, comedy, drama — or say 'no preference')";

pub(crate) const NOSTALGIC_PROMPT: &str = "I'm not finding strong matches yet. \
Is there a movie or series you've watched before that really stuck with you?";

/// Split a list-valued answer: " and " becomes a comma, then split on commas,
/// trim, and drop empties.
fn split_list(answer: &str) -> Vec<String> {
    answer
        .replace(" and ", ",")
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

/// Genre answers containing "no preference" (any case) mean the empty list.
fn parse_genres(answer: &str) -> Vec<String> {
    if answer.to_lowercase().contains("no preference") {
        Vec::new()
    } else {
        split_list(answer)
    }
}

/// Asks for tonight's moods.
pub struct AskMood;

#[async_trait]
impl Step<RecommenderState> for AskMood {
    async fn run(
        &self,
        _state: &RecommenderState,
        ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        match ctx.take_resume() {
            None => Ok(StepOutcome::RequestInput {
                prompt: MOOD_PROMPT.to_string(),
            }),
            Some(answer) => Ok(StepOutcome::Update(StateUpdate {
                mood: Some(split_list(&answer)),
                ..Default::default()
            })),
        }
    }
}

/// Asks movie, series, or both. The answer is stored as given, trimmed; the
/// wording of the question carries the expected vocabulary.
pub struct AskMediaType;

#[async_trait]
impl Step<RecommenderState> for AskMediaType {
    async fn run(
        &self,
        _state: &RecommenderState,
        ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        match ctx.take_resume() {
            None => Ok(StepOutcome::RequestInput {
                prompt: MEDIA_TYPE_PROMPT.to_string(),
            }),
            Some(answer) => Ok(StepOutcome::Update(StateUpdate {
                media_type: Some(answer.trim().to_string()),
                ..Default::default()
            })),
        }
    }
}

/// Asks for genre preferences.
pub struct AskGenres;

#[async_trait]
impl Step<RecommenderState> for AskGenres {
    async fn run(
        &self,
        _state: &RecommenderState,
        ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        match ctx.take_resume() {
            None => Ok(StepOutcome::RequestInput {
                prompt: GENRES_PROMPT.to_string(),
            }),
            Some(answer) => Ok(StepOutcome::Update(StateUpdate {
                genres: Some(parse_genres(&answer)),
                ..Default::default()
            })),
        }
    }
}

/// One-shot fallback: asks for a beloved past title when search came up thin.
/// Sets `asked_nostalgic` unconditionally, which is what bounds the
/// search/nostalgic cycle to a single traversal.
pub struct AskNostalgic;

#[async_trait]
impl Step<RecommenderState> for AskNostalgic {
    async fn run(
        &self,
        _state: &RecommenderState,
        ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        match ctx.take_resume() {
            None => Ok(StepOutcome::RequestInput {
                prompt: NOSTALGIC_PROMPT.to_string(),
            }),
            Some(answer) => Ok(StepOutcome::Update(StateUpdate {
                nostalgic_title: Some(answer.trim().to_string()),
                asked_nostalgic: Some(true),
                ..Default::default()
            })),
        }
    }
}
