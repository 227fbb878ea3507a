//! The scaffolding wizard
//!
//! This module provides:
//! - Immutable state snapshots ([`WizardState`])
//! - A pure reducer from events to transitions ([`Wizard::reduce`])
//! - A pure render function ([`render`])
//! - The async driver loop ([`Wizard::run`])

pub mod driver;
pub mod render;
pub mod state;
pub mod step;
pub mod steps;
pub mod task;

pub use driver::WizardOutcome;
pub use render::{render, Frame, FrameLine};
pub use state::WizardState;
pub use step::StepId;
pub use steps::{connect_url, Delays, Effect, Event, Transition, Wizard, WizardOptions};
pub use task::TaskResult;
