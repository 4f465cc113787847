//! Context builder for agent prompts.
//!
//! A [`Context`] pairs a system prompt with the tools an agent may call and
//! turns a conversation history into the message list sent to the model.

use crate::tools::{ToolDefinition, ToolRunner};

use super::message::{Message, Role};

/// Maximum history messages to include in prompt (prevents unbounded growth).
const MAX_HISTORY_MESSAGES: usize = 40;

/// System prompt and tools for one agent.
pub struct Context {
    pub system_prompt: String,
    pub tools: ToolRunner,
    history_window: usize,
}

impl Context {
    pub fn new(system_prompt: impl Into<String>, tools: ToolRunner) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            tools,
            history_window: MAX_HISTORY_MESSAGES,
        }
    }

    /// Override how many history messages are sent per request.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Build messages list for LLM call with history windowing.
    ///
    /// A window that would start on a tool result is widened back to the
    /// assistant turn that requested it.
    pub fn build_messages(&self, history: &[Message]) -> Vec<Message> {
        let mut start = history.len().saturating_sub(self.history_window);
        while start > 0 && start < history.len() && history[start].role == Role::Tool {
            start -= 1;
        }
        let windowed_history = &history[start..];

        let mut messages = Vec::with_capacity(windowed_history.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.extend(windowed_history.iter().cloned());
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::ToolCallRequest;
    use serde_json::json;

    #[test]
    fn test_context_build_messages() {
        let ctx = Context::new("You are a helpful assistant.", ToolRunner::new());
        let messages = ctx.build_messages(&[Message::user("Hello")]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Hello");
    }

    #[test]
    fn test_empty_system_prompt_is_skipped() {
        let ctx = Context::new("", ToolRunner::new());
        let messages = ctx.build_messages(&[Message::user("Hello")]);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_history_windowing() {
        let ctx = Context::new("sys", ToolRunner::new());

        let history: Vec<Message> = (0..100)
            .map(|i| Message::user(format!("Message {}", i)))
            .collect();

        let messages = ctx.build_messages(&history);

        // Should have: system + MAX_HISTORY_MESSAGES
        assert_eq!(messages.len(), MAX_HISTORY_MESSAGES + 1);

        // Last message should be the most recent
        assert!(messages.last().unwrap().content.contains("99"));
    }

    #[test]
    fn test_window_widens_to_tool_request() {
        let ctx = Context::new("sys", ToolRunner::new()).with_history_window(2);
        let call = ToolCallRequest::new("tc_1", "calculator", json!({"expression": "1+1"}));
        let history = vec![
            Message::user("What is 1+1?"),
            Message::assistant_with_tools("", vec![call]),
            Message::tool_result("tc_1", "Result: 2"),
            Message::assistant("It is 2."),
        ];

        let messages = ctx.build_messages(&history);
        assert_eq!(messages.len(), 4);
        assert!(messages[1].has_tool_calls());
        assert_eq!(messages[3].content, "It is 2.");
    }

    #[test]
    fn test_window_of_only_tool_results_keeps_history() {
        let ctx = Context::new("sys", ToolRunner::new()).with_history_window(1);
        let call = ToolCallRequest::new("tc_1", "calculator", json!({"expression": "1+1"}));
        let history = vec![
            Message::user("What is 1+1?"),
            Message::assistant_with_tools("", vec![call]),
            Message::tool_result("tc_1", "Result: 2"),
        ];

        let messages = ctx.build_messages(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].role, Role::Tool);
    }
}
