//! Adapters module - user-facing front ends.
//!
//! - [`cli::StdConsole`] connects the conversation loop to the terminal
//! - [`cli::CliChannel`] runs an agent task as a REPL

pub mod cli;

pub use cli::{CliChannel, StdConsole};
