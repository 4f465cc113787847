//! OpenAI-compatible chat-completions client.
//!
//! Works with any endpoint that speaks the `/chat/completions` protocol
//! (OpenAI, Gemini's OpenAI-compatible surface, LiteLLM proxies, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::agent::request::ChatRequest;
use crate::config::Config;
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::super::message::{Message, ToolCallRequest};
use super::types::{ChatCompletion, WireToolCall};
use super::{LlmClient, LlmResponse, Usage};

/// Chat-completions client using bearer-token authentication.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    api_base: String,
    model: String,
    temperature: f64,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiClient {
    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_api_key()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn build_request(&self, messages: &[Message], tools: &[ToolDefinition]) -> ChatRequest {
        ChatRequest::new(&self.model, messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_tools(tools)
    }
}

/// Turn a decoded completion into an [`LlmResponse`].
///
/// Missing choices and tool arguments that are not a JSON object are
/// reported as malformed.
pub(crate) fn parse_completion(completion: ChatCompletion) -> Result<LlmResponse> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Llm("No choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(parse_tool_call)
        .collect::<Result<Vec<_>>>()?;

    let usage = completion
        .usage
        .map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content: choice.message.content.filter(|c| !c.is_empty()),
        tool_calls,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        usage,
    })
}

fn parse_tool_call(call: WireToolCall) -> Result<ToolCallRequest> {
    let raw = call.function.arguments.unwrap_or_default();
    let arguments = if raw.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str::<Value>(&raw).map_err(|e| {
            Error::Llm(format!(
                "Malformed arguments for tool '{}': {e}",
                call.function.name
            ))
        })?
    };

    if !arguments.is_object() {
        return Err(Error::Llm(format!(
            "Arguments for tool '{}' are not an object",
            call.function.name
        )));
    }

    let id = call
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

    Ok(ToolCallRequest::new(id, call.function.name, arguments))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools);
        debug!("POST {} ({} messages, {} tools)", self.build_url(), messages.len(), tools.len());

        let response = self
            .client
            .post(self.build_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("Completion request failed with {status}");
            return Err(Error::Llm(format!("API error ({status}): {error_text}")));
        }

        let body = response.text().await?;
        let completion: ChatCompletion = serde_json::from_str(&body)
            .map_err(|e| Error::Llm(format!("Malformed completion payload: {e}")))?;

        let parsed = parse_completion(completion)?;
        debug!(
            "Completion finished ({}), {} tokens",
            parsed.finish_reason, parsed.usage.total_tokens
        );
        Ok(parsed)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
