//! Interaction seam between the wizard/dashboard logic and the terminal

use crate::wizard::render::Frame;
use anyhow::Result;

/// One entry of a selection prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub hint: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hint: hint.into(),
        }
    }
}

/// Something that can ask the user questions and show wizard progress
pub trait Prompter {
    /// Free-text input. An empty answer is returned as an empty string.
    fn input(&mut self, prompt: &str, placeholder: Option<&str>) -> Result<String>;

    /// Pick one of `choices`, returning its index
    fn select(&mut self, prompt: &str, choices: &[Choice]) -> Result<usize>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Show the current wizard frame
    fn render(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    /// A line of output from a running command
    fn output_line(&mut self, _line: &str) {}

    /// Non-fatal problem with an answer
    fn warning(&mut self, message: &str) {
        log::warn!("{}", message);
    }
}
