//! parley - tool-augmented LLM conversations
//!
//! This library provides an interactive conversation loop that lets a
//! chat-completions model call registered tools, plus a task runner for
//! agents that delegate work to each other.

pub mod agent;
pub mod tools;
pub mod adapters;
pub mod config;
pub mod error;
pub mod ui;

pub use error::{Error, Result};
