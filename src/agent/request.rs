//! Chat-completion request payloads.
//!
//! [`ChatRequest`] is the body sent to `POST /chat/completions`. The
//! `*_request` builders produce the canonical example payloads printed by
//! `parley requests`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::tools::ToolDefinition;

use super::message::{Message, Role};

/// Temperature used when the caller wants varied output.
pub const CREATIVE_TEMPERATURE: f64 = 0.9;
/// Temperature used when the caller wants stable output.
pub const FACTUAL_TEMPERATURE: f64 = 0.2;
/// Output cap used by [`token_limited_request`].
pub const SHORT_ANSWER_TOKENS: u32 = 50;

/// Request body for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            model: model.into(),
            messages: messages.iter().map(wire_message).collect(),
            temperature: None,
            max_tokens: None,
            tools: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_tools(mut self, tools: &[ToolDefinition]) -> Self {
        self.tools = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect();
        self
    }

    pub fn to_json(&self) -> Value {
        // A struct of strings, numbers and Values cannot fail to serialize
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Convert a [`Message`] to its chat-completions wire form.
fn wire_message(m: &Message) -> Value {
    match m.role {
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": m.tool_call_id.as_deref().unwrap_or_default(),
            "content": m.content
        }),
        Role::Assistant if m.has_tool_calls() => {
            let calls: Vec<Value> = m
                .tool_calls
                .iter()
                .flatten()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string()
                        }
                    })
                })
                .collect();

            let content = if m.content.is_empty() {
                Value::Null
            } else {
                Value::String(m.content.clone())
            };

            json!({
                "role": "assistant",
                "content": content,
                "tool_calls": calls
            })
        }
        role => json!({
            "role": role.as_str(),
            "content": m.content
        }),
    }
}

/// A single user question.
pub fn simple_request(model: &str) -> ChatRequest {
    ChatRequest::new(model, &[Message::user("What is the capital of France?")])
}

/// A multi-turn conversation ending in a follow-up question.
pub fn conversation_request(model: &str) -> ChatRequest {
    let messages = [
        Message::system("You are a helpful programming assistant."),
        Message::user("What is a variable?"),
        Message::assistant(
            "A variable is a named storage location in memory that holds a value.",
        ),
        Message::user("What are the rules for naming variables?"),
    ];
    ChatRequest::new(model, &messages)
}

/// A creative prompt whose temperature depends on `creativity_needed`.
pub fn temperature_request(model: &str, creativity_needed: bool) -> ChatRequest {
    let temperature = if creativity_needed {
        CREATIVE_TEMPERATURE
    } else {
        FACTUAL_TEMPERATURE
    };

    ChatRequest::new(model, &[Message::user("Generate a haiku about programming")])
        .with_temperature(temperature)
}

/// A long-answer prompt capped at [`SHORT_ANSWER_TOKENS`].
pub fn token_limited_request(model: &str) -> ChatRequest {
    ChatRequest::new(model, &[Message::user("Explain machine learning in detail")])
        .with_max_tokens(Some(SHORT_ANSWER_TOKENS))
}
