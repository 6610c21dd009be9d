//! Confirmation before overwriting published queries.

use std::io::{self, BufRead, Write};

/// Asks the user whether to go on.
pub trait Confirm {
    fn confirm(&self, message: &str) -> io::Result<bool>;
}

/// Approves everything without asking (`--force-replace`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _message: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Prompts on stdout and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> io::Result<bool> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{message} [y/N] ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
