//! Steps, step outcomes, and the interrupt protocol
//!
//! This module defines the execution contract between the engine and application
//! steps. A step never blocks on the user and never raises a control-flow signal
//! to pause: it is a pure async function over `(state, context)` returning a
//! [`StepOutcome`] value.
//!
//! # The protocol
//!
//! - A step that needs user input and has none returns
//!   [`StepOutcome::RequestInput`] with the question text. The engine persists
//!   the pause and returns control to the caller; the process may exit.
//! - When the answer arrives (a later request), the engine re-enters the **same**
//!   step with the answer available via [`StepContext::take_resume`]. The step
//!   consumes it and returns [`StepOutcome::Update`] with a state patch.
//! - Steps that never ask questions ignore the resume slot entirely.
//!
//! The resume slot is one-shot: it is consumed by the first `take_resume` call
//! and is never offered to any subsequent step in the same drive, so an answer
//! can never leak into a later question.
//!
//! # Token streaming
//!
//! The context optionally carries a token sink. The engine wires the sink only
//! into the step designated by `GraphBuilder::stream_tokens_from`; for every
//! other step [`StepContext::emit`] is a no-op. This is what confines stream
//! chunks to the final user-facing answer.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::state::GraphState;
use crate::stream::StreamEvent;

/// What a step produced.
#[derive(Debug)]
pub enum StepOutcome<S: GraphState> {
    /// Normal completion: merge this patch and continue along the edges.
    Update(S::Patch),
    /// Pause the thread and ask the user this question.
    RequestInput {
        /// Question text shown verbatim to the user.
        prompt: String,
    },
}

/// Per-execution context handed to a step.
///
/// Carries the one-shot resume answer and, for the designated streaming step,
/// a bounded token sink.
pub struct StepContext {
    resume: Option<String>,
    tokens: Option<mpsc::Sender<StreamEvent>>,
}

impl StepContext {
    /// Context with no pending answer and no token sink.
    pub fn new() -> Self {
        Self {
            resume: None,
            tokens: None,
        }
    }

    /// Context carrying a pending answer for the re-entered step.
    pub fn with_resume(answer: String) -> Self {
        Self {
            resume: Some(answer),
            tokens: None,
        }
    }

    /// Attach a token sink (engine-internal, for the designated streaming step).
    pub(crate) fn with_tokens(mut self, sink: mpsc::Sender<StreamEvent>) -> Self {
        self.tokens = Some(sink);
        self
    }

    /// Consume the pending answer, if any. One-shot.
    pub fn take_resume(&mut self) -> Option<String> {
        self.resume.take()
    }

    /// True when this step should stream its output token by token.
    pub fn is_streaming(&self) -> bool {
        self.tokens.is_some()
    }

    /// Forward a token fragment to the consumer.
    ///
    /// Applies backpressure when the channel is full. A consumer that dropped
    /// the stream is not an error; the step keeps running and its outcome is
    /// still persisted.
    pub async fn emit(&self, fragment: impl Into<String>) {
        if let Some(sink) = &self.tokens {
            let _ = sink.send(StreamEvent::Chunk(fragment.into())).await;
        }
    }
}

impl Default for StepContext {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of dialogue work.
///
/// Steps read the state, talk to collaborators, and return an outcome; they
/// never write state directly and never persist anything themselves.
#[async_trait]
pub trait Step<S: GraphState>: Send + Sync {
    /// Execute against the current state.
    async fn run(&self, state: &S, ctx: &mut StepContext) -> Result<StepOutcome<S>>;
}
