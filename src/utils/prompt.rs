use crate::error::{QdataError, Result};
use dialoguer::Confirm;

/// Asks the operator a yes/no question.
pub trait Prompt {
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Blocking confirmation on the controlling terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| QdataError::Io(std::io::Error::other(e)))
    }
}

/// Answers every question the same way. Used by tests and scripted callers.
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(self.0)
    }
}
