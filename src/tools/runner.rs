//! Tool runner - static registry of named tools

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;
use super::{ListDirTool, ReadFileTool, Tool, ToolResult, WriteFileTool};

/// Tool definition for LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool runner manages registered tools and executes them.
///
/// Names are validated against the registry before any handler runs.
pub struct ToolRunner {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Create a tool runner with the file tools rooted at `workspace`
    pub fn with_file_tools(workspace: &Path) -> Self {
        let mut runner = Self::new();
        runner.register(ListDirTool::new(workspace));
        runner.register(ReadFileTool::new(workspace));
        runner.register(WriteFileTool::new(workspace));
        runner
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    /// Get tool definitions for LLM, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> ToolResult {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(format!("Unknown tool: {name}")))?;

        debug!("Executing tool: {} with args: {}", name, params);
        tool.execute(params).await
    }

    /// Execute a tool and render the outcome as conversation text
    pub async fn run(&self, name: &str, params: Value) -> String {
        match self.execute(name, params).await {
            Ok(output) => {
                debug!("Tool {} succeeded: {} chars", name, output.len());
                output
            }
            Err(e) => {
                debug!("Tool {} failed: {:?}", name, e);
                e.render()
            }
        }
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Check if a registered tool finishes the task that calls it
    pub fn ends_task(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|t| t.ends_task())
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::CountingTool;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_tool_runner_register_and_execute() {
        let mut runner = ToolRunner::new();
        runner.register(CountingTool::new("test_tool", "success"));

        assert!(runner.has("test_tool"));

        let result = runner.execute("test_tool", serde_json::json!({})).await.unwrap();
        assert_eq!(result, "success");
    }

    #[tokio::test]
    async fn test_tool_runner_unknown_tool() {
        let runner = ToolRunner::new();
        let result = runner.execute("unknown", serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));

        let text = runner.run("unknown", serde_json::json!({})).await;
        assert!(text.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_unknown_name_runs_no_handler() {
        let tool = CountingTool::new("calculator", "Result: 4");
        let calls = tool.calls.clone();
        let runner = ToolRunner::new().with(tool);

        let _ = runner.execute("calculater", serde_json::json!({})).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        runner.execute("calculator", serde_json::json!({})).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_file_tools_registered() {
        let runner = ToolRunner::with_file_tools(Path::new("."));
        assert_eq!(runner.tool_names(), vec!["list_dir", "read_file", "write_file"]);
        assert_eq!(runner.definitions().len(), 3);
    }
}
