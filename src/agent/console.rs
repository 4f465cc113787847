//! Console - where the conversation loop gets input and shows output.

use async_trait::async_trait;

use crate::Result;

/// Inputs that end an interactive conversation (compared case-insensitively).
pub const QUIT_KEYWORDS: [&str; 4] = ["quit", "exit", "q", "x"];

/// True when `input` is one of [`QUIT_KEYWORDS`], ignoring case and
/// surrounding whitespace.
pub fn is_quit(input: &str) -> bool {
    let input = input.trim();
    QUIT_KEYWORDS.iter().any(|kw| input.eq_ignore_ascii_case(kw))
}

/// Something the loop surfaces to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Model answer
    Reply(String),
    /// Text a tool produced
    ToolResult { name: String, result: String },
    /// Loop status (limits, goodbyes, ignored requests)
    Notice(String),
    /// Recovered failure, already prefixed with `Error:`
    Error(String),
}

/// Line-oriented input plus a sink for [`Output`].
#[async_trait]
pub trait Console: Send {
    /// Block until a line is available; `None` once the input is exhausted.
    async fn read_line(&mut self) -> Result<Option<String>>;

    fn show(&mut self, output: Output);
}

/// Console fed from a script, recording everything shown.
#[cfg(test)]
pub struct ScriptedConsole {
    lines: std::collections::VecDeque<Option<String>>,
    pub shown: Vec<Output>,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| Some(l.to_string())).collect(),
            shown: Vec::new(),
        }
    }

    /// Fail with an I/O error once the scripted lines run out.
    pub fn then_broken(mut self) -> Self {
        self.lines.push_back(None);
        self
    }

    pub fn replies(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|o| match o {
                Output::Reply(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|o| match o {
                Output::Notice(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self) -> Result<Option<String>> {
        match self.lines.pop_front() {
            Some(Some(line)) => Ok(Some(line)),
            Some(None) => Err(crate::Error::Input("input stream broke".to_string())),
            None => Ok(None),
        }
    }

    fn show(&mut self, output: Output) {
        self.shown.push(output);
    }
}
