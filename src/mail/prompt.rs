use std::io::{BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use super::error::AccountError;

/// Interactive input needed by the account commands
pub trait Prompter {
    /// Read a secret without echoing it
    fn password(&self, prompt: &str) -> Result<String>;

    /// Free-form single line answer
    fn answer(&self, prompt: &str) -> Result<String>;
}

/// Terminal prompts through dialoguer.
///
/// When stdin or stderr is not a terminal, answers are read as plain lines
/// from stdin so that `echo yes | mail-mgmt delete ...` works.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn interactive() -> bool {
        std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
    }
}

impl Prompter for TerminalPrompter {
    fn password(&self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .context("failed to read password")
    }

    fn answer(&self, prompt: &str) -> Result<String> {
        if !Self::interactive() {
            eprint!("{prompt}: ");
            let _ = std::io::stderr().flush();
            return read_answer(&mut std::io::stdin().lock());
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("failed to read answer")
    }
}

/// One line from `reader` without its line ending. End of input is an
/// empty answer.
pub fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("failed to read answer")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// True for `yes` or `y`, ignoring case and surrounding whitespace
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Ask twice and require both entries to match
pub fn password_with_confirmation(
    prompter: &dyn Prompter,
    prompt: &str,
    confirm_prompt: &str,
) -> Result<String> {
    let first = prompter.password(prompt)?;
    let second = prompter.password(confirm_prompt)?;
    if first != second {
        return Err(AccountError::PasswordMismatch.into());
    }
    Ok(first)
}
