//! Core trait for language-model integration.
//!
//! This crate is an **orchestration framework**, not an LLM client library:
//! the core provides the [`ChatModel`] trait and the application supplies an
//! implementation for its provider of choice. The engine and tool loop hold an
//! `Arc<dyn ChatModel>` and stay provider-agnostic.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use watchgraph_core::llm::{ChatModel, ChatRequest, ChatResponse, TokenStream};
//! use async_trait::async_trait;
//!
//! struct MyProvider { api_key: String }
//!
//! #[async_trait]
//! impl ChatModel for MyProvider {
//!     async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
//!         // convert messages, call the API, convert the response back
//!         todo!()
//!     }
//!
//!     async fn stream(&self, request: ChatRequest) -> Result<TokenStream> {
//!         // same, but yield text fragments as they arrive
//!         todo!()
//!     }
//! }
//! ```

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::llm::tools::ToolDefinition;
use crate::messages::Message;

/// A chat request: transcript plus optional tool declarations.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Transcript in conversation order.
    pub messages: Vec<Message>,
    /// Tools the model may call during this request.
    pub tools: Vec<ToolDefinition>,
}

impl ChatRequest {
    /// Create a request from a transcript
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }

    /// Bind tool declarations to this request
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// A complete (non-streaming) model reply.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant message, possibly carrying tool-call requests.
    pub message: Message,
}

impl ChatResponse {
    /// Wrap an assistant message as a response
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// Stream of text fragments from a streaming chat call.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Chat-based language model.
///
/// Implementations must be `Send + Sync`; share them across steps as
/// `Arc<dyn ChatModel>`. Transport and provider failures should surface as
/// [`GraphError::Upstream`](crate::error::GraphError::Upstream) so the engine
/// can leave the thread's checkpoint retryable.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete reply for the request.
    ///
    /// When the request carries tool declarations, the reply's message may
    /// request tool calls instead of (or alongside) text.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Stream a reply as text fragments.
    ///
    /// Used only by steps that never bind tools, so every fragment is safe to
    /// forward to the end user verbatim.
    async fn stream(&self, request: ChatRequest) -> Result<TokenStream>;
}
