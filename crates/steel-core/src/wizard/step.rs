//! Wizard step identifiers

use std::fmt;

/// One discrete stage of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepId {
    ProjectName,
    Template,
    PackageManager,
    Directory,
    EnvVar,
    Scaffold,
    ApiKey,
    Dependencies,
    Success,
}

impl StepId {
    pub fn id(&self) -> &'static str {
        match self {
            StepId::ProjectName => "projectname",
            StepId::Template => "template",
            StepId::PackageManager => "packagemanager",
            StepId::Directory => "directory",
            StepId::EnvVar => "envvar",
            StepId::Scaffold => "scaffold",
            StepId::ApiKey => "apikey",
            StepId::Dependencies => "dependencies",
            StepId::Success => "success",
        }
    }

    /// Task list label
    pub fn label(&self) -> &'static str {
        match self {
            StepId::ProjectName => "Project name",
            StepId::Template => "Select template",
            StepId::PackageManager => "Pick your package manager",
            StepId::Directory => "Writing directory",
            StepId::EnvVar => "Setting up environment variables",
            StepId::Scaffold => "Scaffolding project",
            StepId::ApiKey => "Grabbing Steel API key",
            StepId::Dependencies => "Installing dependencies",
            StepId::Success => "Done",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
