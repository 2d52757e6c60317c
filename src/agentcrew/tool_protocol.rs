//! Tools an agent may call while working on a task.
//!
//! Agents with tools get a tool catalogue appended to their task prompt and may answer with
//! a JSON fragment of the form `{"tool_call": {"name": "...", "parameters": {...}}}`. The
//! pipeline runs the tool, sends the result back as the next user message and keeps going
//! until the model answers without a tool call or the agent's
//! [`max_iterations`](crate::agent::Agent::max_iterations) are spent.
//!
//! # Example
//!
//! ```rust
//! use agentcrew::tool_protocol::{Tool, ToolError, ToolResult};
//! use async_trait::async_trait;
//! use serde_json::json;
//!
//! struct Clock;
//!
//! #[async_trait]
//! impl Tool for Clock {
//!     fn name(&self) -> &str {
//!         "clock"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Current UTC time"
//!     }
//!
//!     async fn execute(&self, _parameters: serde_json::Value) -> Result<ToolResult, ToolError> {
//!         Ok(ToolResult::success(json!({ "now": "2024-05-01T12:00:00Z" })))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Outcome of one tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: serde_json::Value,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

/// One parameter advertised in the tool catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The model asked for a tool the agent does not have.
    NotFound(String),
    ExecutionFailed(String),
    InvalidParameters(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool not found: {}", name),
            ToolError::ExecutionFailed(msg) => write!(f, "Tool execution failed: {}", msg),
            ToolError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
        }
    }
}

impl Error for ToolError {}

/// A capability an agent can invoke. Shared as `Arc<dyn Tool>` across agents.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    async fn execute(&self, parameters: serde_json::Value) -> Result<ToolResult, ToolError>;
}

/// A tool request found in a model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub parameters: serde_json::Value,
}

/// Find the first `{"tool_call": {...}}` fragment in `response`.
///
/// Braces are matched outside JSON strings only, so parameters containing `}` survive.
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let start = response.find("{\"tool_call\"")?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;
    for (offset, ch) in response[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let parsed: serde_json::Value = serde_json::from_str(&response[start..end?]).ok()?;
    let call = parsed.get("tool_call")?;
    Some(ToolCall {
        name: call.get("name")?.as_str()?.to_string(),
        parameters: call
            .get("parameters")
            .cloned()
            .unwrap_or(serde_json::Value::Null),
    })
}

/// Catalogue appended to the task prompt of an agent with tools.
pub fn tools_prompt(tools: &[std::sync::Arc<dyn Tool>]) -> String {
    let mut prompt = String::from("You have access to the following tools:\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        let parameters = tool.parameters();
        if !parameters.is_empty() {
            prompt.push_str("  Parameters:\n");
            for param in &parameters {
                prompt.push_str(&format!(
                    "    - {}{}: {}\n",
                    param.name,
                    if param.required { " (required)" } else { "" },
                    param.description
                ));
            }
        }
    }
    prompt.push_str(
        "\nTo use a tool, respond with a JSON object in the following format:\n\
         {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
         After tool execution, I'll provide the result and you can continue. \
         Answer without a tool call once you have your final answer.",
    );
    prompt
}

/// The user message reporting a tool execution back to the model.
pub fn tool_result_message(name: &str, result: &Result<ToolResult, ToolError>) -> String {
    match result {
        Ok(result) if result.success => format!(
            "Tool '{}' executed successfully. Result: {}",
            name,
            serde_json::to_string_pretty(&result.output)
                .unwrap_or_else(|_| result.output.to_string())
        ),
        Ok(result) => format!(
            "Tool '{}' failed. Error: {}",
            name,
            result.error.as_deref().unwrap_or("Unknown error")
        ),
        Err(err) => format!("Tool execution error: {}", err),
    }
}
