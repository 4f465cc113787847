//! Conversation loop - the hand-rolled input/completion/tool cycle.
//!
//! Each [`ConversationLoop::step`] performs exactly one transition:
//!
//! ```text
//! AwaitingInput ──input──▶ AwaitingCompletion ──text──▶ AwaitingInput (round +1)
//!       │                        │
//!       │ quit / EOF             └─tool──▶ ToolDetected ──▶ AwaitingToolFollowup
//!       ▼                                                          │
//!   Terminated ◀──────────── max rounds ◀─────── (round +1) ◀──────┘
//! ```
//!
//! Completion failures and unknown tools fall back to `AwaitingInput`
//! without counting a round. Only a broken input source is an error.

use tracing::{debug, info, warn};

use crate::tools::ToolDefinition;
use crate::Result;

use super::console::{is_quit, Console, Output};
use super::context::Context;
use super::llm::LlmClient;
use super::message::{Message, ToolCallRequest};

/// Notice shown one round before the limit.
pub const LIMIT_WARNING: &str = "Reaching conversation limit...";

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    QuitKeyword,
    MaxRounds,
    InputClosed,
}

/// Where the loop is.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    AwaitingInput,
    AwaitingCompletion,
    ToolDetected(ToolCallRequest),
    AwaitingToolFollowup,
    Terminated(Termination),
}

/// Everything the loop mutates. Only the loop holds it.
#[derive(Debug)]
pub struct LoopState {
    phase: Phase,
    round: usize,
    history: Vec<Message>,
}

impl LoopState {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Completed rounds.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated(_))
    }
}

/// What is left once the loop has finished.
#[derive(Debug)]
pub struct LoopOutcome {
    pub reason: Termination,
    pub rounds: usize,
    pub history: Vec<Message>,
}

/// Interactive conversation with at most one tool call per round.
pub struct ConversationLoop<C: LlmClient> {
    client: C,
    context: Context,
    tools: Vec<ToolDefinition>,
    max_rounds: usize,
    state: LoopState,
}

impl<C: LlmClient> ConversationLoop<C> {
    pub fn new(client: C, context: Context, max_rounds: usize) -> Self {
        let tools = context.definitions();
        Self {
            client,
            context,
            tools,
            max_rounds,
            state: LoopState {
                phase: Phase::AwaitingInput,
                round: 0,
                history: Vec::new(),
            },
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Drive the loop until it terminates.
    pub async fn run<I: Console + ?Sized>(mut self, console: &mut I) -> Result<LoopOutcome> {
        info!("Conversation started (max {} rounds)", self.max_rounds);

        while !self.state.is_terminated() {
            self.step(console).await?;
        }

        let reason = match self.state.phase {
            Phase::Terminated(reason) => reason,
            _ => Termination::InputClosed,
        };
        info!("Conversation ended after {} rounds: {:?}", self.state.round, reason);

        Ok(LoopOutcome {
            reason,
            rounds: self.state.round,
            history: self.state.history,
        })
    }

    /// Perform one transition and return the new phase.
    pub async fn step<I: Console + ?Sized>(&mut self, console: &mut I) -> Result<&Phase> {
        let phase = std::mem::replace(&mut self.state.phase, Phase::AwaitingInput);

        let next = match phase {
            Phase::Terminated(reason) => Phase::Terminated(reason),
            _ if self.state.round >= self.max_rounds => self.limit_reached(console),
            Phase::AwaitingInput => self.collect_input(console).await?,
            Phase::AwaitingCompletion => self.request_completion(console).await,
            Phase::ToolDetected(call) => self.execute_tool(call, console).await,
            Phase::AwaitingToolFollowup => self.request_followup(console).await,
        };

        debug!("Round {}: -> {:?}", self.state.round, next);
        self.state.phase = next;
        Ok(&self.state.phase)
    }

    async fn collect_input<I: Console + ?Sized>(&mut self, console: &mut I) -> Result<Phase> {
        let Some(line) = console.read_line().await? else {
            return Ok(Phase::Terminated(Termination::InputClosed));
        };

        let input = line.trim();
        if is_quit(input) {
            console.show(Output::Notice("Goodbye!".to_string()));
            return Ok(Phase::Terminated(Termination::QuitKeyword));
        }
        if input.is_empty() {
            return Ok(Phase::AwaitingInput);
        }

        self.state.history.push(Message::user(input));
        Ok(Phase::AwaitingCompletion)
    }

    async fn request_completion<I: Console + ?Sized>(&mut self, console: &mut I) -> Phase {
        let messages = self.context.build_messages(&self.state.history);
        let response = match self.client.chat(&messages, &self.tools).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Completion failed: {}", e);
                console.show(Output::Error(format!("Error: {e}")));
                return Phase::AwaitingInput;
            }
        };

        let text = response.content.unwrap_or_default();
        let requested = response.tool_calls.len();

        match response.tool_calls.into_iter().next() {
            Some(call) if self.context.tools.has(&call.name) => {
                if requested > 1 {
                    warn!("Model requested {} tools at once; acting on '{}' only", requested, call.name);
                }
                self.state
                    .history
                    .push(Message::assistant_with_tools(text, vec![call.clone()]));
                Phase::ToolDetected(call)
            }
            Some(call) => {
                warn!("Model requested unregistered tool '{}'", call.name);
                if !text.is_empty() {
                    console.show(Output::Reply(text));
                }
                console.show(Output::Notice(format!(
                    "Ignoring request for unknown tool '{}'",
                    call.name
                )));
                Phase::AwaitingInput
            }
            None => {
                self.state.history.push(Message::assistant(text.clone()));
                console.show(Output::Reply(text));
                self.finish_round(console)
            }
        }
    }

    async fn execute_tool<I: Console + ?Sized>(
        &mut self,
        call: ToolCallRequest,
        console: &mut I,
    ) -> Phase {
        info!("Executing tool {}", call.name);
        let result = self.context.tools.run(&call.name, call.arguments.clone()).await;

        console.show(Output::ToolResult {
            name: call.name.clone(),
            result: result.clone(),
        });
        self.state.history.push(Message::tool_result(&call.id, result));
        Phase::AwaitingToolFollowup
    }

    async fn request_followup<I: Console + ?Sized>(&mut self, console: &mut I) -> Phase {
        let messages = self.context.build_messages(&self.state.history);
        let response = match self.client.chat(&messages, &self.tools).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Follow-up completion failed: {}", e);
                console.show(Output::Error(format!("Error: {e}")));
                return Phase::AwaitingInput;
            }
        };

        if response.has_tool_calls() {
            debug!("Ignoring tool request in follow-up; one tool per round");
        }

        let text = response.content.unwrap_or_default();
        self.state.history.push(Message::assistant(text.clone()));
        if !text.is_empty() {
            console.show(Output::Reply(text));
        }
        self.finish_round(console)
    }

    fn finish_round<I: Console + ?Sized>(&mut self, console: &mut I) -> Phase {
        self.state.round += 1;

        if self.state.round >= self.max_rounds {
            return self.limit_reached(console);
        }
        if self.state.round + 1 == self.max_rounds {
            console.show(Output::Notice(LIMIT_WARNING.to_string()));
        }
        Phase::AwaitingInput
    }

    fn limit_reached<I: Console + ?Sized>(&mut self, console: &mut I) -> Phase {
        console.show(Output::Notice(format!(
            "Conversation limit of {} rounds reached. Goodbye!",
            self.max_rounds
        )));
        Phase::Terminated(Termination::MaxRounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::console::ScriptedConsole;
    use crate::agent::llm::{FakeLlmClient, LlmResponse};
    use crate::agent::message::Role;
    use crate::error::Error;
    use crate::tools::{CalculatorTool, CountingTool, ToolRunner};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn calculator_context() -> Context {
        Context::new("You can do calculations.", ToolRunner::new().with(CalculatorTool::new()))
    }

    fn chat_loop(client: FakeLlmClient, max_rounds: usize) -> ConversationLoop<FakeLlmClient> {
        ConversationLoop::new(client, calculator_context(), max_rounds)
    }

    #[tokio::test]
    async fn test_quit_keywords_terminate_without_round() {
        for keyword in ["quit", "QUIT", "q", "X", "Exit"] {
            let mut console = ScriptedConsole::new(&[keyword, "never read"]);
            let outcome = chat_loop(FakeLlmClient::new(vec![]), 5)
                .run(&mut console)
                .await
                .unwrap();

            assert_eq!(outcome.reason, Termination::QuitKeyword);
            assert_eq!(outcome.rounds, 0);
            assert!(outcome.history.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_a_noop() {
        let mut console = ScriptedConsole::new(&["", "   ", "\t"]);
        let mut conversation = chat_loop(FakeLlmClient::new(vec![]), 5);

        for _ in 0..3 {
            let phase = conversation.step(&mut console).await.unwrap();
            assert_eq!(phase, &Phase::AwaitingInput);
            assert_eq!(conversation.state().round(), 0);
            assert!(conversation.state().history().is_empty());
        }
        assert!(console.shown.is_empty());
    }

    #[tokio::test]
    async fn test_plain_reply_counts_a_round() {
        let client = FakeLlmClient::new(vec!["New Delhi."]);
        let mut console = ScriptedConsole::new(&["What is the capital of India?", "q"]);

        let outcome = chat_loop(client, 5).run(&mut console).await.unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(console.replies(), vec!["New Delhi."]);
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(outcome.history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_tool_round_walks_every_phase() {
        let client = FakeLlmClient::with_tool_call(
            "calculator",
            json!({"expression": "4 * 6"}),
            "4 * 6 is 24.",
        );
        let mut console = ScriptedConsole::new(&["What is 4 * 6?"]);
        let mut conversation = chat_loop(client, 5);

        assert_eq!(conversation.step(&mut console).await.unwrap(), &Phase::AwaitingCompletion);
        assert!(matches!(
            conversation.step(&mut console).await.unwrap(),
            Phase::ToolDetected(call) if call.name == "calculator"
        ));
        assert_eq!(conversation.step(&mut console).await.unwrap(), &Phase::AwaitingToolFollowup);
        assert_eq!(conversation.step(&mut console).await.unwrap(), &Phase::AwaitingInput);
        assert_eq!(conversation.state().round(), 1);

        let history = conversation.state().history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].role, Role::Tool);
        assert_eq!(history[2].content, "Result: 24");
        assert_eq!(history[2].tool_call_id.as_deref(), Some("tc_1"));

        assert_eq!(
            console.shown[0],
            Output::ToolResult {
                name: "calculator".to_string(),
                result: "Result: 24".to_string()
            }
        );
        assert_eq!(console.replies(), vec!["4 * 6 is 24."]);
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back_as_text() {
        let client = Arc::new(FakeLlmClient::with_tool_call(
            "calculator",
            json!({"expression": "1 / 0"}),
            "That cannot be computed.",
        ));
        let mut console = ScriptedConsole::new(&["What is 1 / 0?"]);

        let outcome = ConversationLoop::new(client.clone(), calculator_context(), 5)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 1);
        assert!(outcome.history[2].content.starts_with("Error:"));
        // Follow-up request carried the tool result
        let calls = client.calls();
        assert_eq!(calls[1].last().unwrap().role, Role::Tool);
    }

    #[tokio::test]
    async fn test_unregistered_tool_is_not_executed() {
        let counting = CountingTool::new("calculator", "Result: 1");
        let calls = counting.calls.clone();
        let context = Context::new("sys", ToolRunner::new().with(counting));
        let client = FakeLlmClient::scripted(vec![
            Ok(LlmResponse::tool_call("weather", json!({"city": "Paris"}))),
            Ok(LlmResponse::text("I can't check the weather.")),
        ]);
        let mut console = ScriptedConsole::new(&["Weather in Paris?", "Never mind", "q"]);

        let outcome = ConversationLoop::new(client, context, 5)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.rounds, 1);
        assert!(console.notices()[0].contains("unknown tool 'weather'"));
        assert_eq!(console.replies(), vec!["I can't check the weather."]);
    }

    #[tokio::test]
    async fn test_only_first_tool_call_is_acted_on() {
        let first = CountingTool::new("first", "one");
        let second = CountingTool::new("second", "two");
        let (first_calls, second_calls) = (first.calls.clone(), second.calls.clone());
        let context = Context::new("sys", ToolRunner::new().with(first).with(second));

        let mut both = LlmResponse::tool_call("first", json!({}));
        both.tool_calls.push(ToolCallRequest::new("tc_2", "second", json!({})));
        let client = FakeLlmClient::scripted(vec![Ok(both), Ok(LlmResponse::text("done"))]);
        let mut console = ScriptedConsole::new(&["do both"]);

        let outcome = ConversationLoop::new(client, context, 5)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.history[1].tool_calls.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_service_error_reprompts() {
        let client = FakeLlmClient::scripted(vec![
            Err(Error::Llm("connection refused".to_string())),
            Ok(LlmResponse::text("Back online.")),
        ]);
        let mut console = ScriptedConsole::new(&["hello", "hello again", "q"]);

        let outcome = chat_loop(client, 5).run(&mut console).await.unwrap();

        assert_eq!(outcome.rounds, 1);
        assert!(matches!(&console.shown[0], Output::Error(e) if e.starts_with("Error:")));
        assert_eq!(console.replies(), vec!["Back online."]);
        // Both user turns stay in history
        assert_eq!(outcome.history.len(), 3);
    }

    #[tokio::test]
    async fn test_max_rounds_terminates_with_warning() {
        let client = Arc::new(FakeLlmClient::new(vec!["one", "two", "three"]));
        let mut console = ScriptedConsole::new(&["a", "b", "c"]);

        let outcome = ConversationLoop::new(client.clone(), calculator_context(), 2)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(outcome.reason, Termination::MaxRounds);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(client.calls().len(), 2);

        let notices = console.notices();
        assert_eq!(notices[0], LIMIT_WARNING);
        assert!(notices[1].contains("limit of 2 rounds"));
    }

    #[tokio::test]
    async fn test_round_counter_never_exceeds_max() {
        let client = FakeLlmClient::new(vec!["r"; 10]);
        let mut console = ScriptedConsole::new(&["a"; 10]);
        let mut conversation = chat_loop(client, 3);
        let mut last_len = 0;

        while !conversation.state().is_terminated() {
            conversation.step(&mut console).await.unwrap();
            assert!(conversation.state().round() <= 3);
            assert!(conversation.state().history().len() >= last_len);
            last_len = conversation.state().history().len();
        }
        assert_eq!(conversation.state().round(), 3);
    }

    #[tokio::test]
    async fn test_zero_rounds_terminates_immediately() {
        let mut console = ScriptedConsole::new(&["hello"]);
        let outcome = chat_loop(FakeLlmClient::new(vec![]), 0)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(outcome.reason, Termination::MaxRounds);
        assert!(outcome.history.is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input_closes_cleanly() {
        let mut console = ScriptedConsole::new(&["hi"]);
        let outcome = chat_loop(FakeLlmClient::new(vec!["hello"]), 5)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(outcome.reason, Termination::InputClosed);
        assert_eq!(outcome.rounds, 1);
    }

    #[tokio::test]
    async fn test_broken_input_is_fatal() {
        let mut console = ScriptedConsole::new(&[]).then_broken();
        let result = chat_loop(FakeLlmClient::new(vec![]), 5).run(&mut console).await;
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[tokio::test]
    async fn test_unregistered_tool_text_is_still_shown() {
        let mut call = LlmResponse::tool_call("weather", json!({"city": "Paris"}));
        call.content = Some("Let me check the forecast.".to_string());
        let client = FakeLlmClient::scripted(vec![Ok(call)]);
        let mut console = ScriptedConsole::new(&["Weather in Paris?", "q"]);

        let outcome = chat_loop(client, 5).run(&mut console).await.unwrap();

        assert_eq!(outcome.rounds, 0);
        assert_eq!(console.replies(), vec!["Let me check the forecast."]);
        assert!(console.notices()[0].contains("unknown tool 'weather'"));
        assert_eq!(outcome.history.len(), 1);
    }

    #[tokio::test]
    async fn test_followup_failure_keeps_tool_result() {
        let counting = CountingTool::new("calculator", "Result: 24");
        let calls = counting.calls.clone();
        let context = Context::new("sys", ToolRunner::new().with(counting));
        let client = FakeLlmClient::scripted(vec![
            Ok(LlmResponse::tool_call("calculator", json!({"expression": "4 * 6"}))),
            Err(Error::Llm("connection reset".to_string())),
        ]);
        let mut console = ScriptedConsole::new(&["What is 4 * 6?"]);
        let mut conversation = ConversationLoop::new(client, context, 5);

        for _ in 0..3 {
            conversation.step(&mut console).await.unwrap();
        }
        assert_eq!(conversation.step(&mut console).await.unwrap(), &Phase::AwaitingInput);

        let state = conversation.state();
        assert_eq!(state.round(), 0);
        let roles: Vec<Role> = state.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
        assert_eq!(state.history()[2].content, "Result: 24");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(console.shown.last(), Some(Output::Error(e)) if e.starts_with("Error:")));
    }

    #[tokio::test]
    async fn test_tool_call_in_followup_is_not_executed() {
        let counting = CountingTool::new("calculator", "Result: 24");
        let calls = counting.calls.clone();
        let context = Context::new("sys", ToolRunner::new().with(counting));

        let mut again = LlmResponse::tool_call("calculator", json!({"expression": "24 + 1"}));
        again.content = Some("It is 24.".to_string());
        let client = FakeLlmClient::scripted(vec![
            Ok(LlmResponse::tool_call("calculator", json!({"expression": "4 * 6"}))),
            Ok(again),
        ]);
        let mut console = ScriptedConsole::new(&["What is 4 * 6?", "q"]);

        let outcome = ConversationLoop::new(client, context, 5)
            .run(&mut console)
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let roles: Vec<Role> = outcome.history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert!(!outcome.history[3].has_tool_calls());
        assert_eq!(console.replies(), vec!["It is 24."]);
    }
}
