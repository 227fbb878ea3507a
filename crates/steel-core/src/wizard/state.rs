//! Wizard state snapshot
//!
//! Every mutation consumes the snapshot and returns a new one. The only
//! checked mutation is [`WizardState::with_step`], which refuses to move
//! backwards in the flow's step order.

use crate::error::WizardError;
use crate::flow::FlowConfig;
use crate::package_manager::PackageManager;
use crate::templates::Template;
use crate::wizard::step::StepId;
use crate::wizard::task::TaskResult;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    flow: &'static str,
    order: &'static [StepId],
    step: StepId,
    template: Option<Template>,
    directory: PathBuf,
    package_manager: PackageManager,
    project_name: Option<String>,
    env: BTreeMap<String, String>,
    tasks: BTreeMap<StepId, TaskResult>,
    skipped: BTreeSet<StepId>,
}

impl WizardState {
    /// Initial state of a flow: first step, no template, default directory, npm
    pub fn new<F: FlowConfig>(flow: &F, cwd: &Path) -> Self {
        let order = flow.steps();
        Self {
            flow: flow.name(),
            order,
            step: order.first().copied().unwrap_or(StepId::Success),
            template: None,
            directory: flow.default_directory(cwd),
            package_manager: PackageManager::default(),
            project_name: None,
            env: BTreeMap::new(),
            tasks: BTreeMap::new(),
            skipped: BTreeSet::new(),
        }
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn order(&self) -> &'static [StepId] {
        self.order
    }

    /// Index of a step in this flow's order
    pub fn position(&self, step: StepId) -> Option<usize> {
        self.order.iter().position(|s| *s == step)
    }

    /// Step following the current one in the flow order
    pub fn next_step(&self) -> Option<StepId> {
        self.position(self.step)
            .and_then(|i| self.order.get(i + 1))
            .copied()
    }

    /// Move to `next`. Forward jumps are allowed, backward moves are not.
    pub fn with_step(mut self, next: StepId) -> Result<Self, WizardError> {
        let to = self
            .position(next)
            .ok_or(WizardError::UnknownStep(next, self.flow))?;
        let from = self
            .position(self.step)
            .ok_or(WizardError::UnknownStep(self.step, self.flow))?;
        if to < from {
            return Err(WizardError::BackwardTransition {
                from: self.step,
                to: next,
            });
        }
        log::debug!("{}: {} -> {}", self.flow, self.step, next);
        self.step = next;
        Ok(self)
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn with_directory(mut self, directory: PathBuf) -> Self {
        self.directory = directory;
        self
    }

    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    pub fn with_package_manager(mut self, pm: PackageManager) -> Self {
        self.package_manager = pm;
        self
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn with_project_name(mut self, name: String) -> Self {
        self.project_name = Some(name);
        self
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Task state of a step (pending if never touched)
    pub fn task(&self, step: StepId) -> &TaskResult {
        static PENDING: TaskResult = TaskResult::Pending;
        self.tasks.get(&step).unwrap_or(&PENDING)
    }

    pub fn with_task(mut self, step: StepId, task: TaskResult) -> Self {
        self.tasks.insert(step, task);
        self
    }

    /// Whether a step was bypassed without rendering
    pub fn is_skipped(&self, step: StepId) -> bool {
        self.skipped.contains(&step)
    }

    pub fn with_skipped(mut self, step: StepId) -> Self {
        self.skipped.insert(step);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{Cookbook, Forge};

    #[test]
    fn test_initial_state() {
        let cwd = PathBuf::from("/work");
        let cookbook = WizardState::new(&Cookbook, &cwd);
        assert_eq!(cookbook.step(), StepId::ProjectName);
        assert_eq!(cookbook.directory(), Path::new("/work/steel-project"));
        assert_eq!(cookbook.package_manager(), PackageManager::Npm);
        assert!(cookbook.template().is_none());

        let forge = WizardState::new(&Forge, &cwd);
        assert_eq!(forge.directory(), Path::new("steel-project"));
        assert_eq!(forge.task(StepId::Template), &TaskResult::Pending);
    }

    #[test]
    fn test_steps_only_move_forward() {
        let state = WizardState::new(&Forge, Path::new("."));
        let state = state.with_step(StepId::PackageManager).unwrap();
        let err = state.clone().with_step(StepId::Template).unwrap_err();
        assert!(matches!(
            err,
            WizardError::BackwardTransition {
                from: StepId::PackageManager,
                to: StepId::Template
            }
        ));
        // Staying put and skipping ahead are fine
        let state = state.with_step(StepId::PackageManager).unwrap();
        assert_eq!(
            state.with_step(StepId::Dependencies).unwrap().step(),
            StepId::Dependencies
        );
    }

    #[test]
    fn test_steps_outside_flow_are_rejected() {
        let state = WizardState::new(&Forge, Path::new("."));
        assert!(matches!(
            state.with_step(StepId::ApiKey),
            Err(WizardError::UnknownStep(StepId::ApiKey, "forge"))
        ));
    }

    #[test]
    fn test_last_write_wins() {
        let state = WizardState::new(&Cookbook, Path::new("."))
            .with_package_manager(PackageManager::Yarn)
            .with_package_manager(PackageManager::Bun)
            .with_directory(PathBuf::from("a"))
            .with_directory(PathBuf::from("b"));
        assert_eq!(state.package_manager(), PackageManager::Bun);
        assert_eq!(state.directory(), Path::new("b"));
    }
}
