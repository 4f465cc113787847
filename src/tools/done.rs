//! Done tool - lets the model end a task with a final answer

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, Tool, ToolResult};

/// Name the task loop watches for.
pub const DONE_TOOL: &str = "done";

/// Signals task completion; `content` is the answer returned to the caller.
pub struct DoneTool;

#[async_trait]
impl Tool for DoneTool {
    fn name(&self) -> &str { DONE_TOOL }
    fn description(&self) -> &str {
        "Finish the task. Put everything the user should see in `content`; nothing outside this tool is shown"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Final response for the user"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        Ok(required_str(&params, "content")?.to_string())
    }

    fn ends_task(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_done_returns_content() {
        let out = DoneTool.execute(json!({"content": "a.txt\nb.txt"})).await.unwrap();
        assert_eq!(out, "a.txt\nb.txt");
        assert!(DoneTool.execute(json!({})).await.is_err());
        assert!(DoneTool.ends_task());
    }
}
