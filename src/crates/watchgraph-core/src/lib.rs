//! # watchgraph-core
//!
//! A resumable dialogue graph engine. Applications wire pure async steps into a
//! graph with direct and conditional edges, compile it against a checkpoint
//! backend, and drive long-lived conversations through it one user turn at a
//! time.
//!
//! ## Design
//!
//! - **Interrupts are values.** A step that needs user input returns
//!   [`StepOutcome::RequestInput`]; the engine persists the pause as checkpoint
//!   data and the process is free to exit between turns.
//! - **Steps are pure.** `(state, context) -> outcome`; the engine owns all
//!   persistence and all control flow.
//! - **Step keys are a closed enum.** Edges and branch targets are validated when
//!   the graph compiles, not when a conversation happens to reach them.
//! - **Collaborators are injected.** The model ([`ChatModel`]) and the checkpoint
//!   backend ([`CheckpointSaver`](watchgraph_checkpoint::CheckpointSaver)) are
//!   trait objects handed in at construction.
//! - **Tool use is bounded.** [`ToolLoopExecutor`] enforces a hard cap on tool
//!   invocations structurally.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use watchgraph_core::{GraphBuilder, RunOutcome};
//! use watchgraph_checkpoint::InMemoryCheckpointSaver;
//! use std::sync::Arc;
//!
//! let engine = GraphBuilder::new()
//!     .add_step(StepId::AskMood, AskMood)
//!     .set_entry(StepId::AskMood)
//!     .finish_at(StepId::AskMood)
//!     .compile(Arc::new(InMemoryCheckpointSaver::new()))?;
//!
//! let (thread_id, outcome) = engine.start(MyState::default()).await?;
//! if let RunOutcome::Suspended { prompt } = outcome {
//!     println!("{prompt}");
//! }
//! // ... next request cycle ...
//! let outcome = engine.resume(&thread_id, "relaxed".to_string()).await?;
//! ```

pub mod engine;
pub mod error;
pub mod graph;
pub mod interrupt;
pub mod llm;
pub mod messages;
pub mod state;
pub mod stream;
pub mod tool_loop;

pub use engine::{GraphEngine, RunOutcome};
pub use error::{GraphError, Result};
pub use graph::GraphBuilder;
pub use interrupt::{Step, StepContext, StepOutcome};
pub use llm::{ChatModel, ChatRequest, ChatResponse, TokenStream, ToolCall, ToolDefinition};
pub use messages::{Message, MessageRole};
pub use state::{GraphState, StepKey};
pub use stream::StreamEvent;
pub use tool_loop::{ToolFuture, ToolHandler, ToolLoopExecutor, DEFAULT_MAX_TOOL_CALLS};
