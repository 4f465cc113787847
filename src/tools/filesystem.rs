//! Filesystem tools - read, write, and list files
//!
//! Relative paths resolve against the workspace the tool was built with;
//! messages always quote the path exactly as the model sent it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use super::{required_str, Tool, ToolResult};

fn path_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// List directory contents
pub struct ListDirTool {
    root: PathBuf,
}

impl ListDirTool {
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str { "list_dir" }
    fn description(&self) -> &str { "List all files and directories in a specified path" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": path_schema("Path to the directory whose contents are to be listed")
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let path = required_str(&params, "path")?;
        let full = self.root.join(path);

        if !full.exists() {
            return Err(ToolError::NotFound(format!("Path '{path}' does not exist.")));
        }
        if !full.is_dir() {
            return Err(ToolError::InvalidArgument(format!("'{path}' is not a directory.")));
        }

        let mut entries: Vec<String> = std::fs::read_dir(&full)
            .map_err(|e| ToolError::from_io(path, e))?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        entries.sort();

        if entries.is_empty() {
            Ok("(empty directory)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }
}

/// Read file contents
pub struct ReadFileTool {
    root: PathBuf,
}

impl ReadFileTool {
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str { "read_file" }
    fn description(&self) -> &str { "Read and return the contents of a specified file" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": path_schema("Full path to the file to be read")
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let path = required_str(&params, "path")?;

        std::fs::read_to_string(self.root.join(path)).map_err(|e| ToolError::from_io(path, e))
    }
}

/// Write content to a file
pub struct WriteFileTool {
    root: PathBuf,
}

impl WriteFileTool {
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str { "write_file" }
    fn description(&self) -> &str { "Write text content to a file at a given path, replacing it if it exists" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": path_schema("Full path to the file to write to"),
                "content": {
                    "type": "string",
                    "description": "Text content to write into the file"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let path = required_str(&params, "path")?;
        let content = required_str(&params, "content")?;
        let full = self.root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ToolError::from_io(path, e))?;
        }

        std::fs::write(&full, content).map_err(|e| ToolError::from_io(path, e))?;

        Ok(format!("Successfully wrote to '{path}'"))
    }
}
