//! Flow configuration trait for the project wizard
//!
//! This trait defines the interface that each scaffolding flow (cookbook,
//! forge) implements to parameterize the shared wizard.

use crate::package_manager::{self, PackageManager};
use crate::runtime::completion::CompletionMode;
use crate::templates::Template;
use crate::wizard::step::StepId;
use std::path::{Path, PathBuf};

/// Configuration trait for the scaffolding flows
///
/// Each flow implements this trait to define:
/// - Flow identity (name, display name)
/// - The ordered steps it runs
/// - Project naming and directory rules
/// - Package manager candidates and what follows their selection
/// - How asynchronous steps decide they are done
pub trait FlowConfig: Clone + Send + Sync + 'static {
    /// Internal flow name (used for the CLI command)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Steps in the order they run; the last one is terminal
    fn steps(&self) -> &'static [StepId];

    /// Project directory before a name has been chosen
    fn default_directory(&self, cwd: &Path) -> PathBuf;

    /// Project directory for a normalized project name
    fn project_directory(&self, cwd: &Path, name: &str) -> PathBuf;

    /// Name used when neither input nor a default argument is given
    fn fallback_name(&self) -> Option<&'static str>;

    /// Step entered after a package manager has been picked
    fn after_package_manager(&self) -> StepId;

    /// Whether a template given on the command line bypasses the template step
    fn template_preset_skips(&self) -> bool;

    /// Completion mode used when none is requested
    fn default_completion(&self) -> CompletionMode;

    /// Package managers offered for a template
    fn package_managers(&self, template: Option<&Template>) -> &'static [PackageManager] {
        package_manager::candidates_for(template)
    }
}
