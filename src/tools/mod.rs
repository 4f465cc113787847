//! Tools module - agent capabilities
//!
//! Tools are actions the model can request: listing directories, reading and
//! writing files, evaluating arithmetic, or handing a question (or a
//! sentiment judgement) to another agent task.

mod calculator;
mod delegate;
mod done;
mod expr;
mod filesystem;
mod runner;
pub mod sentiment;

pub use calculator::CalculatorTool;
pub use delegate::DelegateTool;
pub use done::{DoneTool, DONE_TOOL};
pub use expr::{Evaluator, ExprError};
pub use filesystem::{ListDirTool, ReadFileTool, WriteFileTool};
pub use runner::{ToolDefinition, ToolRunner};
pub use sentiment::{BatchResultTool, ParagraphSentimentTool, SentimentResultTool, SentimentTool};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;

/// Outcome of a tool handler: success text or a typed failure.
pub type ToolResult = std::result::Result<String, ToolError>;

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> ToolResult;

    /// A successful call ends the task that issued it, its output
    /// becoming the task's answer
    fn ends_task(&self) -> bool {
        false
    }

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Fetch a required string parameter.
pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> std::result::Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArgument(format!("Missing '{key}' parameter")))
}

/// Tool that counts its invocations, for tests.
#[cfg(test)]
pub struct CountingTool {
    pub name: String,
    pub result: String,
    pub calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl CountingTool {
    pub fn new(name: &str, result: &str) -> Self {
        Self {
            name: name.to_string(),
            result: result.to_string(),
            calls: Default::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Counting tool for testing" }
    fn parameters(&self) -> Value { serde_json::json!({"type": "object"}) }

    async fn execute(&self, _params: Value) -> ToolResult {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.result.clone())
    }
}
