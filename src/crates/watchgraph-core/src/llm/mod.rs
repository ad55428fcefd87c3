//! Language-model abstraction
//!
//! - [`ChatModel`] - provider-agnostic trait the application implements
//! - [`ChatRequest`] / [`ChatResponse`] - transcript in, assistant message out
//! - [`ToolDefinition`] / [`ToolCall`] - tool declarations and call requests
//! - [`TokenStream`] - fragment stream for the final, tool-free answer

pub mod tools;
pub mod traits;

pub use tools::{ToolCall, ToolDefinition};
pub use traits::{ChatModel, ChatRequest, ChatResponse, TokenStream};
