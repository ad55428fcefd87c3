//! Graph wiring and the public `Recommender` API
//!
//! This module assembles the dialogue graph and wraps the engine in the
//! turn-oriented surface a transport layer consumes.
//!
//! # Graph Shape
//!
//! ```text
//! ask_mood ──► ask_media_type ──► ask_genres ──► search_library
//!                                                     │
//!                                  ┌──────────────────┴─────┐
//!                                  ▼                        ▼
//!                           ask_nostalgic          check_availability
//!                                  │                        │
//!                                  └──► search_library      ▼
//!                                                      recommend ──► end
//! ```
//!
//! The conditional edge after the search proceeds when at least `min_matches`
//! candidates were found or the nostalgic question is spent; `recommend` is the
//! designated token-streaming step.
//!
//! # Turns
//!
//! Every turn is one engine drive: [`Recommender::start`] opens a thread and
//! returns the first question; [`Recommender::reply`] answers the pending question
//! and returns either the next question or the finished recommendation;
//! [`Recommender::reply_stream`] is the streaming variant for the final turn.

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use watchgraph_checkpoint::CheckpointSaver;
use watchgraph_core::{
    ChatModel, GraphBuilder, GraphEngine, Result, RunOutcome, StreamEvent,
};

use crate::config::RecommenderConfig;
use crate::providers::{CatalogProvider, SearchProvider};
use crate::router::{route_after_search, StepId};
use crate::state::RecommenderState;
use crate::steps::{
    AskGenres, AskMediaType, AskMood, AskNostalgic, CheckAvailability, Recommend, SearchLibrary,
};

/// What a turn produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnReply {
    /// The dialogue needs another answer.
    Question(String),
    /// The dialogue is finished; this is the formatted recommendation.
    Recommendation(String),
}

/// Result of opening a new conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct StartReply {
    /// Thread id to use for every later turn.
    pub thread_id: String,
    /// The opening question.
    pub reply: TurnReply,
}

/// The movie/series recommendation dialogue.
pub struct Recommender {
    engine: GraphEngine<RecommenderState, StepId>,
}

impl Recommender {
    /// Wire the dialogue graph against injected collaborators.
    pub fn new(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchProvider>,
        catalog: Arc<dyn CatalogProvider>,
        checkpointer: Arc<dyn CheckpointSaver>,
        config: RecommenderConfig,
    ) -> Result<Self> {
        let min_matches = config.min_matches;

        let engine = GraphBuilder::new()
            .add_step(StepId::AskMood, AskMood)
            .add_step(StepId::AskMediaType, AskMediaType)
            .add_step(StepId::AskGenres, AskGenres)
            .add_step(
                StepId::SearchLibrary,
                SearchLibrary::new(search, config.search_limit),
            )
            .add_step(StepId::AskNostalgic, AskNostalgic)
            .add_step(
                StepId::CheckAvailability,
                CheckAvailability::new(model.clone(), catalog, config.clone()),
            )
            .add_step(StepId::Recommend, Recommend::new(model))
            .set_entry(StepId::AskMood)
            .add_edge(StepId::AskMood, StepId::AskMediaType)
            .add_edge(StepId::AskMediaType, StepId::AskGenres)
            .add_edge(StepId::AskGenres, StepId::SearchLibrary)
            .add_branch(
                StepId::SearchLibrary,
                move |state: &RecommenderState| route_after_search(state, min_matches),
                vec![StepId::CheckAvailability, StepId::AskNostalgic],
            )
            .add_edge(StepId::AskNostalgic, StepId::SearchLibrary)
            .add_edge(StepId::CheckAvailability, StepId::Recommend)
            .finish_at(StepId::Recommend)
            .stream_tokens_from(StepId::Recommend)
            .compile(checkpointer)?;

        Ok(Self { engine })
    }

    /// Open a new conversation; returns its thread id and the opening question.
    pub async fn start(&self) -> Result<StartReply> {
        let (thread_id, outcome) = self.engine.start(RecommenderState::default()).await?;
        info!(thread_id = %thread_id, "conversation opened");
        Ok(StartReply {
            thread_id,
            reply: Self::to_reply(outcome),
        })
    }

    /// Answer the pending question and run until the next question or the end.
    pub async fn reply(&self, thread_id: &str, answer: impl Into<String>) -> Result<TurnReply> {
        let outcome = self.engine.resume(thread_id, answer.into()).await?;
        Ok(Self::to_reply(outcome))
    }

    /// Streaming variant of [`reply`](Self::reply): recommendation tokens arrive
    /// as [`StreamEvent::Chunk`]s, followed by one terminal event.
    pub async fn reply_stream(
        &self,
        thread_id: &str,
        answer: impl Into<String>,
    ) -> Result<ReceiverStream<StreamEvent>> {
        self.engine.resume_stream(thread_id, answer.into()).await
    }

    fn to_reply(outcome: RunOutcome<RecommenderState>) -> TurnReply {
        match outcome {
            RunOutcome::Suspended { prompt } => TurnReply::Question(prompt),
            RunOutcome::Completed(state) => {
                TurnReply::Recommendation(state.recommendation.unwrap_or_default())
            }
        }
    }
}
