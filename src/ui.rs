//! Terminal presentation helpers.

use colored::*;
use terminal_size::{terminal_size, Width};

use crate::agent::{LoopOutcome, Termination, QUIT_KEYWORDS};

fn rule() -> String {
    let width = terminal_size().map(|(Width(w), _)| w as usize).unwrap_or(80);
    "─".repeat(width)
}

/// Banner shown before an interactive session.
pub fn print_header(model: &str, api_base: &str) {
    println!("{}", rule().dimmed());
    println!(
        "  {} {}",
        "parley".yellow().bold(),
        concat!("v", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  {}", format!("{model}  •  {api_base}").cyan());
    println!("  {}", format!("Type {} to leave", QUIT_KEYWORDS.join(" / ")).dimmed());
    println!("{}", rule().dimmed());
}

/// One-line summary once a conversation loop has stopped.
pub fn print_outcome(outcome: &LoopOutcome) {
    let why = match outcome.reason {
        Termination::QuitKeyword => "ended by user",
        Termination::MaxRounds => "round limit reached",
        Termination::InputClosed => "input closed",
    };
    print_step(&format!("{} rounds, {}", outcome.rounds, why));
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "!".yellow().bold(), msg.yellow());
}
