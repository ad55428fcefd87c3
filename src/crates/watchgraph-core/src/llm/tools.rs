//! Tool declarations and tool-call requests
//!
//! A [`ToolDefinition`] tells the model what it may call; a [`ToolCall`] is the
//! model asking for one invocation. Execution lives in the tool loop
//! ([`ToolLoopExecutor`](crate::tool_loop::ToolLoopExecutor)), which pairs each
//! call with a registered handler and feeds the result back as a tool message.

use serde::{Deserialize, Serialize};

/// Declaration of a callable tool, passed to the model with a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to request this tool.
    pub name: String,
    /// What the tool does, phrased for the model.
    pub description: String,
    /// JSON schema of the arguments, if the tool takes any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl ToolDefinition {
    /// Create a tool definition with no parameter schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    /// Attach a JSON schema describing the arguments
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id correlating the call with its result message.
    pub id: String,
    /// Name of the requested tool.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Extract a string argument by name, if present.
    pub fn string_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}
