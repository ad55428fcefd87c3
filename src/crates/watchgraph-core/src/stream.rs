//! Outward streaming events
//!
//! A streaming resume yields a sequence of [`StreamEvent`]s over a bounded channel.
//! Chunks may only originate from the step the graph designated for token streaming
//! (see `GraphBuilder::stream_tokens_from`), so callers can render chunks directly
//! without worrying about leaked tool-call fragments from intermediate steps.
//!
//! Every stream ends with exactly one terminal event:
//!
//! - [`StreamEvent::Done`] - the run completed
//! - [`StreamEvent::Question`] - the run paused on a new question
//! - [`StreamEvent::Error`] - a step failed

use serde::{Deserialize, Serialize};

/// One event in a streaming resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A token fragment from the designated streaming step.
    Chunk(String),
    /// Terminal: the run paused on this question.
    Question(String),
    /// Terminal: the run completed.
    Done,
    /// Terminal: a step failed with this message.
    Error(String),
}

impl StreamEvent {
    /// True for `Question`, `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk(_))
    }
}
