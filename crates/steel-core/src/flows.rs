//! The two scaffolding flows

use crate::flow::FlowConfig;
use crate::project_name::FALLBACK_PROJECT_NAME;
use crate::runtime::completion::CompletionMode;
use crate::wizard::step::StepId;
use std::path::{Path, PathBuf};

const DEFAULT_DIRECTORY: &str = "steel-project";

/// `steel cookbook` - scaffolds into an absolute directory under the cwd
#[derive(Debug, Clone, Copy, Default)]
pub struct Cookbook;

impl FlowConfig for Cookbook {
    fn name(&self) -> &'static str {
        "cookbook"
    }

    fn display_name(&self) -> &'static str {
        "Steel Cookbook"
    }

    fn steps(&self) -> &'static [StepId] {
        &[
            StepId::ProjectName,
            StepId::Template,
            StepId::PackageManager,
            StepId::Scaffold,
            StepId::ApiKey,
            StepId::Dependencies,
            StepId::Success,
        ]
    }

    fn default_directory(&self, cwd: &Path) -> PathBuf {
        cwd.join(DEFAULT_DIRECTORY)
    }

    fn project_directory(&self, cwd: &Path, name: &str) -> PathBuf {
        cwd.join(name)
    }

    fn fallback_name(&self) -> Option<&'static str> {
        None
    }

    fn after_package_manager(&self) -> StepId {
        StepId::Scaffold
    }

    fn template_preset_skips(&self) -> bool {
        false
    }

    fn default_completion(&self) -> CompletionMode {
        CompletionMode::Timer
    }
}

/// `steel forge` - scaffolds into a directory relative to the cwd
#[derive(Debug, Clone, Copy, Default)]
pub struct Forge;

impl FlowConfig for Forge {
    fn name(&self) -> &'static str {
        "forge"
    }

    fn display_name(&self) -> &'static str {
        "Steel Forge"
    }

    fn steps(&self) -> &'static [StepId] {
        &[
            StepId::ProjectName,
            StepId::Template,
            StepId::PackageManager,
            StepId::Directory,
            StepId::EnvVar,
            StepId::Dependencies,
            StepId::Success,
        ]
    }

    fn default_directory(&self, _cwd: &Path) -> PathBuf {
        PathBuf::from(DEFAULT_DIRECTORY)
    }

    fn project_directory(&self, _cwd: &Path, name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    fn fallback_name(&self) -> Option<&'static str> {
        Some(FALLBACK_PROJECT_NAME)
    }

    fn after_package_manager(&self) -> StepId {
        StepId::Directory
    }

    fn template_preset_skips(&self) -> bool {
        true
    }

    fn default_completion(&self) -> CompletionMode {
        CompletionMode::Await
    }
}
