//! Charm-style terminal front end for the wizard using cliclack

use crate::prompt::{Choice, Prompter};
use crate::wizard::render::Frame;
use crate::wizard::step::StepId;
use crate::wizard::task::TaskResult;
use anyhow::Result;
use std::collections::HashSet;

/// Longest command output line shown next to the spinner
const OUTPUT_PREVIEW_WIDTH: usize = 60;

/// [`Prompter`] backed by cliclack prompts, spinners and log lines
#[derive(Default)]
pub struct CliPrompter {
    reported: HashSet<StepId>,
    spinner: Option<(StepId, cliclack::ProgressBar)>,
}

impl CliPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish_spinner(&mut self, step: StepId, task: &TaskResult, label: &str) -> bool {
        match &self.spinner {
            Some((active, _)) if *active == step => {}
            _ => return false,
        }
        if let Some((_, spinner)) = self.spinner.take() {
            match task {
                TaskResult::Success(message) => spinner.stop(format!("{}: {}", label, message)),
                TaskResult::Error(message) => spinner.error(format!("{}: {}", label, message)),
                _ => spinner.stop(label),
            }
        }
        true
    }
}

impl Prompter for CliPrompter {
    fn input(&mut self, prompt: &str, placeholder: Option<&str>) -> Result<String> {
        let mut input = cliclack::input(prompt).required(false);
        if let Some(placeholder) = placeholder {
            input = input.placeholder(placeholder);
        }
        let value: String = input.interact()?;
        Ok(value)
    }

    fn select(&mut self, prompt: &str, choices: &[Choice]) -> Result<usize> {
        let mut select = cliclack::select(prompt);
        for (idx, choice) in choices.iter().enumerate() {
            select = select.item(idx, &choice.label, &choice.hint);
        }
        let selected: usize = select.interact()?;
        Ok(selected)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let value: bool = cliclack::confirm(prompt).initial_value(default).interact()?;
        Ok(value)
    }

    fn render(&mut self, frame: &Frame) -> Result<()> {
        for line in &frame.lines {
            if self.reported.contains(&line.step) {
                continue;
            }
            match &line.task {
                TaskResult::Pending => {}
                TaskResult::Loading => {
                    if self.spinner.is_none() {
                        let spinner = cliclack::spinner();
                        spinner.start(format!("{}...", line.label));
                        self.spinner = Some((line.step, spinner));
                    }
                }
                TaskResult::Success(message) => {
                    if !self.finish_spinner(line.step, &line.task, line.label) {
                        cliclack::log::success(format!("{}: {}", line.label, message))?;
                    }
                    self.reported.insert(line.step);
                }
                TaskResult::Error(message) => {
                    if !self.finish_spinner(line.step, &line.task, line.label) {
                        cliclack::log::error(format!("{}: {}", line.label, message))?;
                    }
                    self.reported.insert(line.step);
                }
            }
        }
        Ok(())
    }

    fn output_line(&mut self, line: &str) {
        if let Some((step, spinner)) = &self.spinner {
            let preview: String = line.trim().chars().take(OUTPUT_PREVIEW_WIDTH).collect();
            if !preview.is_empty() {
                spinner.set_message(format!("{}: {}", step.label(), preview));
            }
        }
    }

    fn warning(&mut self, message: &str) {
        let _ = cliclack::log::warning(message);
    }
}

impl Drop for CliPrompter {
    fn drop(&mut self) {
        if let Some((_, spinner)) = self.spinner.take() {
            spinner.cancel("Cancelled");
        }
    }
}
