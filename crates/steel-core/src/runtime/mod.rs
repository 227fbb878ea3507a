//! Process execution and step completion
//!
//! This module provides:
//! - Shell command launching and streaming execution
//! - Timer-based completion for the compatibility mode of async steps

pub mod command;
pub mod completion;

pub use command::{chain, launch, run_with_output};
pub use completion::{wait_for_timer, CompletionMode, TimerGuard};
