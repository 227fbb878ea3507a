//! Steel Core - Shared library for the `steel` CLI
//!
//! This library provides the project wizard, template handling, the local
//! session store and the Steel API client. The `steel` binary is a thin
//! clap layer on top of it.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Template catalog/fetching/copying, `.env` editing,
//!   shell command execution, config store, REST client, local runtime control
//! - **Layer 2: Workflow Orchestration** - `FlowConfig` trait, the pure wizard reducer
//!   and its async driver loop, driven through the `Prompter` seam
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use steel_core::{flows::Forge, templates, wizard::{Wizard, WizardOptions}, ConfigStore};
//!
//! let wizard = Wizard::new(Forge, WizardOptions::default(), cwd, ConfigStore::from_env());
//! let source = templates::TemplateSource::Bundled;
//! let mut fetcher = templates::TemplateFetcher::new(source, "my-agent");
//! let outcome = wizard.run(&mut my_prompter, &mut fetcher).await?;
//! ```

pub mod api;
pub mod dev;
pub mod error;
pub mod flow;
pub mod flows;
pub mod links;
pub mod package_manager;
pub mod project_name;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod templates;
pub mod wizard;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use error::{ApiError, WizardError};
pub use flow::FlowConfig;
pub use flows::{Cookbook, Forge};
pub use package_manager::PackageManager;
pub use prompt::{Choice, Prompter};
pub use runtime::CompletionMode;
pub use session::{ConfigStore, Credential, Instance, Settings};
pub use templates::{copy_template, Template, TemplateFetcher, TemplateSource};
pub use wizard::{Wizard, WizardOptions, WizardOutcome, WizardState};

#[cfg(feature = "tui")]
pub use tui::{run_wizard, CreateArgs};
