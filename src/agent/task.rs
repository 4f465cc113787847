//! Task - the built-in completion/tool loop.
//!
//! A task owns one agent's conversation. Each [`Task::run`] feeds the input
//! to the model, executes any requested tools, and keeps going until the
//! model answers in plain text or calls a tool that ends the task (such as
//! `done`).
//! Whether history survives between runs is decided by
//! [`TaskConfig::restart`].

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::Result;

use super::context::Context;
use super::llm::LlmClient;
use super::message::{Message, Response};

/// Text recorded for a tool call handed back to the caller unexecuted.
const RETURNED_TO_CALLER: &str = "(returned to caller)";

#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Completion calls allowed per run
    pub max_iterations: usize,

    /// Start every run from an empty history
    pub restart: bool,

    /// End the run as soon as the model requests any tool
    pub done_if_tool: bool,

    /// Reminder sent (once per run) when the model answers without a tool
    pub nudge: Option<String>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            restart: true,
            done_if_tool: false,
            nudge: None,
        }
    }
}

/// An agent plus its conversation, run one input at a time.
pub struct Task<C: LlmClient> {
    name: String,
    client: C,
    context: Context,
    config: TaskConfig,
    history: Vec<Message>,
}

impl<C: LlmClient> Task<C> {
    pub fn new(name: impl Into<String>, client: C, context: Context, config: TaskConfig) -> Self {
        Self {
            name: name.into(),
            client,
            context,
            config,
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Conversation so far (without the system prompt).
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Forget the conversation.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Run the task for a single input.
    pub async fn run(&mut self, input: &str) -> Result<Response> {
        if self.config.restart {
            self.history.clear();
        }
        self.history.push(Message::user(input));

        info!("[{}] Starting task with message: {}", self.name, input);

        let tools = self.context.definitions();
        let mut nudged = false;

        for iteration in 0..self.config.max_iterations {
            debug!("[{}] Iteration {}/{}", self.name, iteration + 1, self.config.max_iterations);

            let messages = self.context.build_messages(&self.history);
            let response = self.client.chat(&messages, &tools).await?;
            let text = response.content.clone().unwrap_or_default();

            if !response.has_tool_calls() {
                self.history.push(Message::assistant(text.clone()));

                let nudge = self
                    .config
                    .nudge
                    .clone()
                    .filter(|_| !nudged && !self.context.tools.is_empty());
                if let Some(nudge) = nudge {
                    debug!("[{}] No tool used, nudging", self.name);
                    nudged = true;
                    self.history.push(Message::user(nudge));
                    continue;
                }

                info!("[{}] Task completed with response: {} chars", self.name, text.len());
                return Ok(Response::new(text));
            }

            if self.config.done_if_tool {
                let call = response.tool_calls[0].clone();
                self.history
                    .push(Message::assistant_with_tools(text.clone(), vec![call.clone()]));
                self.history
                    .push(Message::tool_result(&call.id, RETURNED_TO_CALLER));
                info!("[{}] Task stopped on tool {}", self.name, call.name);
                return Ok(Response::from_tool_call(text, call));
            }

            self.history.push(Message::assistant_with_tools(
                text,
                response.tool_calls.clone(),
            ));

            // Finishing tools run last so every other call gets its result
            let (finishers, others): (Vec<_>, Vec<_>) = response
                .tool_calls
                .into_iter()
                .partition(|c| self.context.tools.ends_task(&c.name));

            for call in &others {
                let result = self.context.tools.run(&call.name, call.arguments.clone()).await;
                self.history.push(Message::tool_result(&call.id, result));
            }

            for call in &finishers {
                match self.context.tools.execute(&call.name, call.arguments.clone()).await {
                    Ok(content) => {
                        self.history.push(Message::tool_result(&call.id, content.clone()));
                        info!("[{}] Task finished via {}", self.name, call.name);
                        return Ok(Response::new(content));
                    }
                    Err(e) => {
                        debug!("[{}] Finishing tool {} failed: {}", self.name, call.name, e);
                        self.history.push(Message::tool_result(&call.id, e.render()));
                    }
                }
            }
        }

        warn!("[{}] Gave up after {} iterations", self.name, self.config.max_iterations);
        Err(Error::MaxIterations)
    }
}
