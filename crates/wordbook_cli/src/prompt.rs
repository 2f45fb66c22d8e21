//! Line-based yes/no prompt on the controlling terminal.

use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};
use wordbook_core::{Example, PromptError, ReviewPrompt};

/// Yes/no question asked outside a review pass.
pub trait Confirm {
    fn ask(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;
}

pub struct TerminalPrompt<I, O> {
    input: I,
    output: O,
    interactive: bool,
}

impl TerminalPrompt<StdinLock<'static>, Stdout> {
    /// Prompt bound to the process stdin/stdout.
    ///
    /// Refuses to ask anything when stdin is not a terminal.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        Self {
            input: stdin.lock(),
            output: io::stdout(),
            interactive,
        }
    }
}

#[cfg(test)]
impl<I: BufRead, O: Write> TerminalPrompt<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            interactive: true,
        }
    }
}

impl<I: BufRead, O: Write> Confirm for TerminalPrompt<I, O> {
    /// Asks until the answer is empty (`default`), yes or no.
    fn ask(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        if !self.interactive {
            return Err(PromptError::Aborted);
        }

        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            write!(self.output, "? {message} ({hint}) ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Err(PromptError::Aborted);
            }

            match parse_answer(&line) {
                Some(answer) => return Ok(answer.unwrap_or(default)),
                None => writeln!(self.output, "please answer y or n")?,
            }
        }
    }
}

impl<I: BufRead, O: Write> ReviewPrompt for TerminalPrompt<I, O> {
    fn confirm(&mut self, word: &str, example: &Example) -> Result<bool, PromptError> {
        self.ask(&format!("[{word}] [{}]", example.sentence), true)
    }
}

/// `Some(None)` for an empty answer, `None` for anything unrecognized.
fn parse_answer(line: &str) -> Option<Option<bool>> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(None),
        "y" | "yes" => Some(Some(true)),
        "n" | "no" => Some(Some(false)),
        _ => None,
    }
}
