//! # watchgraph-agent
//!
//! A resumable movie/series recommendation dialogue for couples, built on the
//! watchgraph engine. The agent interviews the pair (mood, media type, genres),
//! searches their shared watch history, optionally asks for one nostalgic
//! reference when matches are thin, verifies streaming availability through a
//! bounded tool loop, and finishes with a single formatted recommendation that
//! can be token-streamed.
//!
//! Conversations survive process restarts: each turn is an independent
//! request/response cycle against a checkpoint backend, keyed by thread id.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use watchgraph_agent::{Recommender, RecommenderConfig, TurnReply};
//! use watchgraph_checkpoint::InMemoryCheckpointSaver;
//!
//! let recommender = Recommender::new(
//!     model,      // Arc<dyn ChatModel>
//!     search,     // Arc<dyn SearchProvider>
//!     catalog,    // Arc<dyn CatalogProvider>
//!     Arc::new(InMemoryCheckpointSaver::new()),
//!     RecommenderConfig::from_env(),
//! )?;
//!
//! let opened = recommender.start().await?;
//! println!("{:?}", opened.reply); // "What mood are you two in tonight? ..."
//!
//! match recommender.reply(&opened.thread_id, "relaxed, adventurous").await? {
//!     TurnReply::Question(q) => println!("{q}"),
//!     TurnReply::Recommendation(text) => println!("{text}"),
//! }
//! ```

pub mod agent;
pub mod config;
pub mod providers;
pub mod router;
pub mod state;
pub mod steps;

pub use agent::{Recommender, StartReply, TurnReply};
pub use config::RecommenderConfig;
pub use providers::{
    CatalogEntry, CatalogProvider, MediaMatch, ProviderError, ProviderResult, SearchProvider,
};
pub use router::{route_after_search, StepId};
pub use state::{RecommenderState, StateUpdate};
