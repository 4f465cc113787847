//! Error types for parley

use thiserror::Error;

/// Result type alias for parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in parley
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Input error: {0}")]
    Input(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Max iterations reached")]
    MaxIterations,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Typed failure of a tool handler.
///
/// Callers inside the crate match on the kind; the conversation only ever
/// sees the rendered `Error: ...` text (see [`ToolError::render`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unknown(String),
}

impl ToolError {
    /// Classify an I/O failure on `path`.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => ToolError::NotFound(format!("'{path}' not found: {err}")),
            ErrorKind::PermissionDenied => {
                ToolError::PermissionDenied(format!("permission denied for '{path}': {err}"))
            }
            ErrorKind::InvalidInput | ErrorKind::InvalidData => {
                ToolError::InvalidArgument(format!("'{path}': {err}"))
            }
            _ => ToolError::Unknown(format!("'{path}': {err}")),
        }
    }

    /// Text form fed back into the conversation.
    pub fn render(&self) -> String {
        format!("Error: {self}")
    }
}
