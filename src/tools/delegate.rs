//! Delegate tool - exposes an agent task as a tool

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::agent::{LlmClient, Task};
use crate::error::ToolError;
use super::{required_str, Tool, ToolResult};

/// Hands the `expression` argument to another agent's [`Task`].
///
/// The task is owned by the tool, so a task configured with
/// `restart: false` keeps its conversation between invocations.
pub struct DelegateTool<C: LlmClient> {
    name: String,
    description: String,
    task: Mutex<Task<C>>,
}

impl<C: LlmClient> DelegateTool<C> {
    pub fn new(name: impl Into<String>, description: impl Into<String>, task: Task<C>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            task: Mutex::new(task),
        }
    }
}

#[async_trait]
impl<C: LlmClient + 'static> Tool for DelegateTool<C> {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { &self.description }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Request for the delegate agent (e.g. 'x = 5' or 'x + y')"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let expression = required_str(&params, "expression")?;

        let mut task = self.task.lock().await;
        debug!("Delegating to task {}: {}", task.name(), expression);

        task.run(expression)
            .await
            .map(|response| response.content)
            .map_err(|e| ToolError::Unknown(format!("{} failed: {e}", task.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::FakeLlmClient;
    use crate::agent::{Context, TaskConfig};
    use crate::tools::ToolRunner;
    use std::sync::Arc;

    fn calculator_task(client: Arc<FakeLlmClient>, restart: bool) -> Task<Arc<FakeLlmClient>> {
        let config = TaskConfig { restart, ..TaskConfig::default() };
        Task::new("CalculatorAgent", client, Context::new("calc", ToolRunner::new()), config)
    }

    #[tokio::test]
    async fn test_delegate_keeps_task_history() {
        let client = Arc::new(FakeLlmClient::new(vec![
            "Variable set: x = 5",
            "Calculating: x + 1 = 6",
        ]));
        let tool = DelegateTool::new("calculator", "Stateful calculator", calculator_task(client.clone(), false));

        let first = tool.execute(json!({"expression": "Set x = 5"})).await.unwrap();
        assert_eq!(first, "Variable set: x = 5");

        let second = tool.execute(json!({"expression": "Calculate x + 1"})).await.unwrap();
        assert_eq!(second, "Calculating: x + 1 = 6");

        // Second call saw the first exchange: system + 2 earlier + new user
        let calls = client.calls();
        assert_eq!(calls[1].len(), 4);
        assert_eq!(calls[1][1].content, "Set x = 5");
    }

    #[tokio::test]
    async fn test_delegate_failure_is_tool_error() {
        let client = Arc::new(FakeLlmClient::new(vec![]));
        let tool = DelegateTool::new("calculator", "Stateful calculator", calculator_task(client, true));

        let err = tool.execute(json!({"expression": "1 + 1"})).await.unwrap_err();
        assert!(matches!(err, ToolError::Unknown(_)));
        assert!(err.render().starts_with("Error: CalculatorAgent failed"));
    }

    #[tokio::test]
    async fn test_delegate_requires_expression() {
        let client = Arc::new(FakeLlmClient::new(vec![]));
        let tool = DelegateTool::new("calculator", "Stateful calculator", calculator_task(client, true));

        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
