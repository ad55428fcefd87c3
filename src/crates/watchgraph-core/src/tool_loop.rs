//! Bounded tool-calling loop
//!
//! This module provides **[`ToolLoopExecutor`]** - the agentic loop that lets a
//! [`ChatModel`] call registered tools until it stops asking or a hard invocation
//! cap is reached.
//!
//! # The loop
//!
//! ```text
//! transcript ──► chat(with tools) ──► tool calls? ──no──► return gathered results
//!                      ▲                   │yes
//!                      │                   ▼
//!                      │      execute each call, append tool message,
//!                      └────── accumulate result text
//! ```
//!
//! The cap counts **tool invocations**, not loop rounds, and is enforced
//! structurally: once the budget is spent the executor returns the gathered
//! results without consulting the model again, so no prompt wording can talk the
//! loop past its bound. Hitting the cap is normal operation, not an error.
//!
//! Tool handlers report domain outcomes ("not found", "not available") as plain
//! result text; only transport-level failures surface as errors, which the engine
//! treats as retryable upstream failures.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::llm::{ChatModel, ChatRequest, ToolCall, ToolDefinition};
use crate::messages::Message;

/// Default cap on tool invocations per loop.
pub const DEFAULT_MAX_TOOL_CALLS: usize = 4;

/// Future returned by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// Handler executing one tool call, returning the result text fed back to the model.
pub type ToolHandler = Arc<dyn Fn(ToolCall) -> ToolFuture + Send + Sync>;

/// Runs a model/tool conversation to completion under a hard invocation cap.
pub struct ToolLoopExecutor {
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolDefinition>,
    handlers: HashMap<String, ToolHandler>,
    max_tool_calls: usize,
}

impl ToolLoopExecutor {
    /// Create an executor with the default invocation cap
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            tools: Vec::new(),
            handlers: HashMap::new(),
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
        }
    }

    /// Register a tool and its handler
    pub fn register_tool(
        mut self,
        definition: ToolDefinition,
        handler: impl Fn(ToolCall) -> ToolFuture + Send + Sync + 'static,
    ) -> Self {
        self.handlers
            .insert(definition.name.clone(), Arc::new(handler));
        self.tools.push(definition);
        self
    }

    /// Override the invocation cap
    pub fn with_max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = max;
        self
    }

    /// Drive the loop over a seeded transcript.
    ///
    /// Returns the newline-joined text of every executed tool result, in
    /// execution order; the empty string when the model never called a tool.
    pub async fn run(&self, mut transcript: Vec<Message>) -> Result<String> {
        let mut gathered: Vec<String> = Vec::new();
        let mut calls_used = 0usize;

        loop {
            let request = ChatRequest::new(transcript.clone()).with_tools(self.tools.clone());
            let response = self.model.chat(request).await?;
            let reply = response.message;

            if !reply.has_tool_calls() {
                debug!(calls_used, "model finished without further tool calls");
                break;
            }

            let calls = reply.tool_calls.clone();
            transcript.push(reply);

            for call in &calls {
                if calls_used >= self.max_tool_calls {
                    warn!(cap = self.max_tool_calls, "tool invocation cap reached");
                    return Ok(gathered.join("\n"));
                }
                calls_used += 1;

                let result = self.execute(call.clone()).await?;
                debug!(tool = %call.name, call_id = %call.id, "tool executed");
                gathered.push(result.clone());
                transcript.push(Message::tool(result, call.id.clone()));
            }

            if calls_used >= self.max_tool_calls {
                warn!(cap = self.max_tool_calls, "tool invocation cap reached");
                break;
            }
        }

        Ok(gathered.join("\n"))
    }

    async fn execute(&self, call: ToolCall) -> Result<String> {
        let handler = self.handlers.get(&call.name).ok_or_else(|| {
            GraphError::configuration(format!("model requested unregistered tool '{}'", call.name))
        })?;
        handler(call).await
    }
}
