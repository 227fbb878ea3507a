//! Steel REST API access
//!
//! This module provides:
//! - An authenticated JSON client ([`ApiClient`])
//! - Form-driven endpoint descriptions for the `sessions`, `files` and
//!   `tools` commands

pub mod client;
pub mod dashboard;

pub use client::{base_url, error_message, unwrap_result, ApiClient};
pub use dashboard::{
    call, download, fill_form, fill_path, ApiCommand, Download, Endpoint, Field, FieldKind, Form,
    Section, SelectOption,
};
