//! Tool trait and execution types.

use std::time::Duration;

use async_trait::async_trait;

/// Context handed to a tool for one execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Task the invocation belongs to, if any.
    pub task_id: Option<String>,
    /// Conversation context, if any.
    pub context_id: Option<String>,
}

/// Tool execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

/// Output from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub result: serde_json::Value,
    pub duration: Duration,
}

impl ToolOutput {
    /// A structured result.
    pub fn success(result: serde_json::Value, duration: Duration) -> Self {
        Self { result, duration }
    }

    /// A plain-text result.
    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            result: serde_json::Value::String(text.into()),
            duration,
        }
    }
}

/// A capability exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema of the tool parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;
}

/// Extract a required, non-empty string parameter.
pub fn require_str<'a>(params: &'a serde_json::Value, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::MissingParameter(name.to_string()))
}

/// Extract a required integer parameter.
pub fn require_i64(params: &serde_json::Value, name: &str) -> Result<i64, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ToolError::MissingParameter(name.to_string()))
}
