//! Calculator tool - arithmetic with persistent variables

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use super::expr::{format_number, Evaluation, Evaluator};
use super::{required_str, Tool, ToolResult};

/// Evaluate arithmetic expressions and variable assignments.
///
/// The variable table belongs to this tool instance, so it lives exactly as
/// long as the registry that owns the tool.
#[derive(Default)]
pub struct CalculatorTool {
    evaluator: Mutex<Evaluator>,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str { "calculator" }
    fn description(&self) -> &str {
        "Perform basic arithmetic (+ - * / % ^, parentheses) and store variables with 'name = expression'"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression or variable assignment (e.g. 'x = 5' or 'x + 1')"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let expression = required_str(&params, "expression")?;

        let mut evaluator = self
            .evaluator
            .lock()
            .map_err(|_| ToolError::Unknown("calculator state is unavailable".to_string()))?;

        match evaluator.eval(expression) {
            Ok(Evaluation::Value(value)) => Ok(format!("Result: {}", format_number(value))),
            Ok(Evaluation::Assigned { name, value }) => {
                Ok(format!("Variable set: {name} = {}", format_number(value)))
            }
            Err(e) => Err(ToolError::InvalidArgument(format!("Invalid expression: {e}"))),
        }
    }
}
