//! Agent module - core conversation logic.
//!
//! This module contains:
//! - Message types (Message, ToolCallRequest, Response)
//! - LLM client trait and the OpenAI-compatible implementation
//! - The interactive [`ConversationLoop`] and the delegating [`Task`] loop
//! - Context builder for prompts
//! - Request payload builders

pub mod console;
mod context;
mod loop_impl;
mod message;
pub mod prompts;
pub mod request;
mod task;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use console::{is_quit, Console, Output, QUIT_KEYWORDS};
pub use context::Context;
pub use llm::{LlmClient, LlmResponse, OpenAiClient, Usage};
pub use loop_impl::{ConversationLoop, LoopOutcome, LoopState, Phase, Termination, LIMIT_WARNING};
pub use message::{Message, Response, Role, ToolCallRequest};
pub use task::{Task, TaskConfig};
