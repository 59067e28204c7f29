//! Confirmation prompting, separated from the decision logic so the
//! workflow is testable without a terminal.

use std::io::{self, BufRead, Write};

pub trait Prompter {
    /// Asks a yes/no question; an empty answer takes the default.
    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool>;
}

/// Reads answers from stdin.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{question} {hint} ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        Ok(match line.trim().to_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}
