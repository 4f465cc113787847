//! Sentiment tools - analysis handed to short-lived sub-agent tasks
//!
//! `sentiment_analysis` asks an analyzer agent for a structured verdict and
//! stops it as soon as it calls `sentiment_result`. `analyze_sentiment`
//! labels one paragraph with a single-reply agent, and `batch_result` ends
//! the batch run with the collected labels.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::{prompts, Context, LlmClient, Task, TaskConfig};
use crate::error::ToolError;
use super::{required_str, Tool, ToolResult, ToolRunner};

pub const SENTIMENT_RESULT_TOOL: &str = "sentiment_result";

/// Text returned when the analyzer never reports a verdict.
pub const ANALYSIS_FAILED: &str = "Analysis failed";

/// `"<sentiment> (confidence: <c>)"` from `sentiment_result` arguments.
fn verdict(args: &Value) -> Option<String> {
    let sentiment = args.get("sentiment")?.as_str()?;
    let confidence = args.get("confidence")?.as_f64()?;
    Some(format!("{sentiment} (confidence: {confidence:.2})"))
}

/// Structured verdict the analyzer agent reports through.
pub struct SentimentResultTool;

#[async_trait]
impl Tool for SentimentResultTool {
    fn name(&self) -> &str { SENTIMENT_RESULT_TOOL }
    fn description(&self) -> &str { "Return the sentiment analysis results" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sentiment": {
                    "type": "string",
                    "enum": ["positive", "negative", "neutral"]
                },
                "confidence": {
                    "type": "number",
                    "description": "Confidence from 0.0 to 1.0"
                },
                "summary": {
                    "type": "string",
                    "description": "One-sentence justification"
                }
            },
            "required": ["sentiment", "confidence", "summary"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        verdict(&params).ok_or_else(|| {
            ToolError::InvalidArgument("Expected 'sentiment' and numeric 'confidence'".to_string())
        })
    }
}

/// Runs an analyzer task per call and renders its structured verdict.
pub struct SentimentTool<C> {
    client: C,
}

impl<C: LlmClient + Clone> SentimentTool<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    fn analyzer(&self) -> Task<C> {
        Task::new(
            "SentimentAnalyzer",
            self.client.clone(),
            Context::new(prompts::SENTIMENT_ANALYZER, ToolRunner::new().with(SentimentResultTool)),
            TaskConfig { done_if_tool: true, ..TaskConfig::default() },
        )
    }
}

#[async_trait]
impl<C: LlmClient + Clone + 'static> Tool for SentimentTool<C> {
    fn name(&self) -> &str { "sentiment_analysis" }
    fn description(&self) -> &str { "Analyze sentiment of the provided text" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text to analyze" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let text = required_str(&params, "text")?;

        let mut analyzer = self.analyzer();
        let response = analyzer
            .run(&format!("Analyze sentiment: {text}"))
            .await
            .map_err(|e| ToolError::Unknown(format!("SentimentAnalyzer failed: {e}")))?;

        let rendered = response
            .tool_call
            .filter(|call| call.name == SENTIMENT_RESULT_TOOL)
            .and_then(|call| verdict(&call.arguments));
        if rendered.is_none() {
            debug!("Analyzer answered without a usable {}", SENTIMENT_RESULT_TOOL);
        }
        Ok(rendered.unwrap_or_else(|| ANALYSIS_FAILED.to_string()))
    }
}

/// Labels one paragraph with a single-reply expert task.
pub struct ParagraphSentimentTool<C> {
    client: C,
}

impl<C: LlmClient + Clone> ParagraphSentimentTool<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LlmClient + Clone + 'static> Tool for ParagraphSentimentTool<C> {
    fn name(&self) -> &str { "analyze_sentiment" }
    fn description(&self) -> &str { "Analyze sentiment of a paragraph" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "paragraph_id": { "type": "integer", "description": "1-based paragraph number" },
                "text": { "type": "string", "description": "Paragraph text" }
            },
            "required": ["paragraph_id", "text"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let id = params
            .get("paragraph_id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ToolError::InvalidArgument("Missing 'paragraph_id' parameter".to_string()))?;
        let text = required_str(&params, "text")?;

        let mut expert = Task::new(
            "SentimentExpert",
            self.client.clone(),
            Context::new(prompts::SENTIMENT_EXPERT, ToolRunner::new()),
            TaskConfig { max_iterations: 1, ..TaskConfig::default() },
        );
        let response = expert
            .run(text)
            .await
            .map_err(|e| ToolError::Unknown(format!("SentimentExpert failed: {e}")))?;

        Ok(format!("Paragraph {id}: {}", response.content))
    }
}

/// Ends a batch run with every collected result.
pub struct BatchResultTool;

#[async_trait]
impl Tool for BatchResultTool {
    fn name(&self) -> &str { "batch_result" }
    fn description(&self) -> &str { "Return all sentiment analysis results" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "results": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "One result line per paragraph"
                }
            },
            "required": ["results"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let results = params
            .get("results")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ToolError::InvalidArgument("Missing 'results' parameter".to_string()))?;

        let lines: Vec<String> = results
            .iter()
            .map(|r| r.as_str().map(str::to_string).unwrap_or_else(|| r.to_string()))
            .collect();
        Ok(format!("Analysis complete:\n{}", lines.join("\n")))
    }

    fn ends_task(&self) -> bool {
        true
    }
}

/// Agent that analyzes one text through [`SentimentTool`].
pub fn text_processor<C: LlmClient + Clone + 'static>(client: C, max_iterations: usize) -> Task<C> {
    let tools = ToolRunner::new().with(SentimentTool::new(client.clone()));
    Task::new(
        "TextProcessor",
        client,
        Context::new(prompts::TEXT_PROCESSOR, tools),
        TaskConfig { max_iterations, ..TaskConfig::default() },
    )
}

/// Agent that labels `paragraphs` paragraphs and finishes with `batch_result`.
pub fn batch_processor<C: LlmClient + Clone + 'static>(client: C, paragraphs: usize) -> Task<C> {
    let tools = ToolRunner::new()
        .with(ParagraphSentimentTool::new(client.clone()))
        .with(BatchResultTool);
    Task::new(
        "BatchProcessor",
        client,
        Context::new(prompts::batch_processor(paragraphs), tools),
        // one call per paragraph, the batch result, and slack for a retry
        TaskConfig { max_iterations: paragraphs + 3, ..TaskConfig::default() },
    )
}

/// `"Paragraph N: text"` lines, numbered from 1.
pub fn number_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Paragraph {}: {}", i + 1, p))
        .collect::<Vec<_>>()
        .join("\n")
}
