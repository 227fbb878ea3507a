//! Pure view of a wizard snapshot

use crate::wizard::state::WizardState;
use crate::wizard::step::StepId;
use crate::wizard::task::TaskResult;

/// One visible step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine {
    pub step: StepId,
    pub label: &'static str,
    pub task: TaskResult,
}

/// Everything a front end needs to draw the wizard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Steps reached so far, current one last
    pub lines: Vec<FrameLine>,
    /// Commands to start the project; only set once the wizard is done
    pub run_commands: Vec<String>,
}

impl Frame {
    pub fn current(&self) -> Option<&FrameLine> {
        self.lines.last()
    }
}

/// Build the frame for a snapshot.
///
/// Skipped steps and the terminal step produce no line.
pub fn render(state: &WizardState) -> Frame {
    let current = state.position(state.step()).unwrap_or(0);
    let lines = state
        .order()
        .iter()
        .take(current + 1)
        .filter(|step| **step != StepId::Success && !state.is_skipped(**step))
        .map(|step| FrameLine {
            step: *step,
            label: step.label(),
            task: state.task(*step).clone(),
        })
        .collect();

    let run_commands = match (state.step(), state.template()) {
        (StepId::Success, Some(template)) => {
            template.display_run_commands(state.directory(), state.package_manager())
        }
        _ => Vec::new(),
    };

    Frame {
        lines,
        run_commands,
    }
}
