//! CLI adapter - terminal console and interactive task channel.

use std::io::Write;

use async_trait::async_trait;
use colored::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::{debug, warn};

use crate::agent::{is_quit, Console, LlmClient, Output, Response, Task};
use crate::error::Error;
use crate::Result;

/// Console reading lines from `R` (stdin by default) and printing to stdout.
///
/// A line that is not valid UTF-8 is reported and skipped; only a failing
/// reader ends the session.
pub struct StdConsole<R = BufReader<Stdin>> {
    reader: R,
    prompt: String,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin + Send> StdConsole<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            prompt: "You".to_string(),
        }
    }

    /// Label printed before each input line.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Console for StdConsole<R> {
    async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            print!("{}: ", self.prompt.blue().bold());
            std::io::stdout().flush()?;

            let mut buf = Vec::new();
            let read = self
                .reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| Error::Input(format!("Failed to read input: {e}")))?;
            if read == 0 {
                return Ok(None);
            }

            match String::from_utf8(buf) {
                Ok(line) => return Ok(Some(line.trim_end_matches(['\n', '\r']).to_string())),
                Err(e) => {
                    warn!("Skipping undecodable input line: {}", e);
                    self.show(Output::Error(
                        "Error: input was not valid UTF-8, line skipped".to_string(),
                    ));
                }
            }
        }
    }

    fn show(&mut self, output: Output) {
        match output {
            Output::Reply(text) => println!("\n{}: {}\n", "Bot".green().bold(), text),
            Output::ToolResult { name, result } => {
                println!("  {} {}", format!("[{name}]").magenta(), result.dimmed())
            }
            Output::Notice(text) => println!("  {}", text.yellow()),
            Output::Error(text) => eprintln!("\n{}\n", text.red()),
        }
    }
}

/// REPL around a [`Task`]; history is kept (or not) by the task's config.
pub struct CliChannel<C: LlmClient> {
    task: Task<C>,
}

impl<C: LlmClient> CliChannel<C> {
    pub fn new(task: Task<C>) -> Self {
        Self { task }
    }

    /// Run a single message and return the response.
    pub async fn run_once(&mut self, message: &str) -> Result<Response> {
        self.task.run(message).await
    }

    /// Read, run, show until a quit keyword or end of input.
    pub async fn run_interactive<I: Console + ?Sized>(&mut self, console: &mut I) -> Result<()> {
        while let Some(line) = console.read_line().await? {
            let input = line.trim();

            if is_quit(input) {
                console.show(Output::Notice("Goodbye!".to_string()));
                break;
            }
            if input.is_empty() {
                continue;
            }

            match self.run_once(input).await {
                Ok(response) => console.show(Output::Reply(response.content)),
                Err(e) => console.show(Output::Error(format!("Error: {e}"))),
            }
        }

        debug!("[{}] REPL closed", self.task.name());
        Ok(())
    }

    /// Clear conversation history.
    pub fn clear_history(&mut self) {
        self.task.reset();
    }

    /// Get current history length.
    pub fn history_len(&self) -> usize {
        self.task.history().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::console::ScriptedConsole;
    use crate::agent::llm::FakeLlmClient;
    use crate::agent::{Context, TaskConfig};
    use crate::agent::{ConversationLoop, Termination};
    use crate::tools::ToolRunner;
    use std::io::Cursor;

    fn channel(responses: Vec<&str>) -> CliChannel<FakeLlmClient> {
        let config = TaskConfig { restart: false, ..TaskConfig::default() };
        let task = Task::new("cli", FakeLlmClient::new(responses), Context::new("sys", ToolRunner::new()), config);
        CliChannel::new(task)
    }

    #[tokio::test]
    async fn test_repl_keeps_history_between_turns() {
        let mut channel = channel(vec!["Hi!", "Still here."]);
        let mut console = ScriptedConsole::new(&["hello", "", "are you there?", "EXIT", "ignored"]);

        channel.run_interactive(&mut console).await.unwrap();

        assert_eq!(console.replies(), vec!["Hi!", "Still here."]);
        assert_eq!(channel.history_len(), 4);
        assert_eq!(console.notices(), vec!["Goodbye!"]);

        channel.clear_history();
        assert_eq!(channel.history_len(), 0);
    }

    #[tokio::test]
    async fn test_repl_surfaces_errors_and_continues() {
        let mut channel = channel(vec![]);
        let mut console = ScriptedConsole::new(&["hello", "hello?"]);

        channel.run_interactive(&mut console).await.unwrap();

        let errors: Vec<_> = console
            .shown
            .iter()
            .filter(|o| matches!(o, Output::Error(e) if e.starts_with("Error:")))
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let mut console = StdConsole::from_reader(Cursor::new(b"\xff\xfe bad\nhello\r\n".to_vec()));

        assert_eq!(console.read_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(console.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_loop_survives_undecodable_input() {
        let mut console = StdConsole::from_reader(Cursor::new(b"\xff\xfe bad\nq\n".to_vec()));
        let context = Context::new("sys", ToolRunner::new());

        let outcome = ConversationLoop::new(FakeLlmClient::new(vec![]), context, 5)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(outcome.reason, Termination::QuitKeyword);
        assert_eq!(outcome.rounds, 0);
    }
}
