//! Per-step task outcome

/// Visual state of a step's task
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskResult {
    #[default]
    Pending,
    Loading,
    Success(String),
    Error(String),
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TaskResult::Error(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, TaskResult::Loading)
    }
}
