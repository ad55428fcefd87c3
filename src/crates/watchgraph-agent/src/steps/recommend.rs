//! Final recommendation step
//!
//! The only step allowed to token-stream. It never binds tools, so every fragment
//! the model produces is safe to forward verbatim; when the engine hands it a token
//! sink it uses `ChatModel::stream`, otherwise a plain `chat` call.
//!
//! The assembled text is normalized to start at the first markdown `"## "` heading
//! when one exists, stripping any conversational preamble.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use watchgraph_core::{
    ChatModel, ChatRequest, Message, Result, Step, StepContext, StepOutcome,
};

use crate::state::{RecommenderState, StateUpdate};

const SYSTEM_PROMPT: &str = "You are a movie and TV series recommender for a couple. \
Based on their current mood, preferences, and what they've genuinely enjoyed before, \
recommend exactly ONE specific title they haven't seen yet. \
Explain in 2-3 sentences why it matches their current mood, \
referencing specific things from their past reviews when relevant. \
Format the answer in markdown, starting with the title as a '## ' heading and ending \
with an '### Available on:' line naming where they can stream it.";

/// Produces the single formatted recommendation.
pub struct Recommend {
    model: Arc<dyn ChatModel>,
}

impl Recommend {
    /// Create the step with an injected model
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn build_request(&self, state: &RecommenderState) -> ChatRequest {
        let context = if state.search_results.is_empty() {
            "No strong matches found in their watch history.".to_string()
        } else {
            state
                .search_results
                .iter()
                .map(|m| {
                    let rating = m
                        .user_rating
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    format!(
                        "- {} ({}, rated {rating}/10): They said \"{}\". Partner said \"{}\".",
                        m.title, m.media_type, m.user_review, m.partner_review
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mood = if state.mood.is_empty() {
            "not specified".to_string()
        } else {
            state.mood.join(", ")
        };
        let genres = if state.genres.is_empty() {
            "no preference".to_string()
        } else {
            state.genres.join(", ")
        };

        let human = Message::human(format!(
            "Current mood: {mood}\n\
             Wants: {}\n\
             Genres: {genres}\n\
             Nostalgic reference: {}\n\n\
             Their watch history matches:\n{context}\n\n\
             Streaming availability already verified:\n{}\n\n\
             Give your recommendation.",
            state.media_type.as_deref().unwrap_or("not specified"),
            state.nostalgic_title.as_deref().unwrap_or("none"),
            state.availability_info.as_deref().unwrap_or("not checked"),
        ));

        ChatRequest::new(vec![Message::system(SYSTEM_PROMPT), human])
    }
}

/// Truncate to the first markdown `"## "` heading; unchanged when absent.
fn normalize_heading(text: String) -> String {
    match text.find("## ") {
        Some(index) => text[index..].to_string(),
        None => text,
    }
}

#[async_trait]
impl Step<RecommenderState> for Recommend {
    async fn run(
        &self,
        state: &RecommenderState,
        ctx: &mut StepContext,
    ) -> Result<StepOutcome<RecommenderState>> {
        let request = self.build_request(state);

        let text = if ctx.is_streaming() {
            let mut stream = self.model.stream(request).await?;
            let mut assembled = String::new();
            while let Some(fragment) = stream.next().await {
                let fragment = fragment?;
                ctx.emit(fragment.clone()).await;
                assembled.push_str(&fragment);
            }
            assembled
        } else {
            self.model.chat(request).await?.message.content
        };

        debug!(chars = text.len(), "recommendation generated");
        Ok(StepOutcome::Update(StateUpdate {
            recommendation: Some(normalize_heading(text)),
            ..Default::default()
        }))
    }
}
