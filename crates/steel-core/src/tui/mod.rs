//! CLI prompts using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

#[cfg(feature = "tui")]
mod commands;
#[cfg(feature = "tui")]
mod prompts;

#[cfg(feature = "tui")]
pub use commands::{
    logout, open_link, run_api, run_dev, run_settings, run_wizard, show_config, CreateArgs,
};
#[cfg(feature = "tui")]
pub use prompts::CliPrompter;
