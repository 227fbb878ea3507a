//! Error types shared across the library

use crate::wizard::step::StepId;
use thiserror::Error;

/// Errors raised by the wizard state machine
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Cannot move from step '{from}' back to '{to}'")]
    BackwardTransition { from: StepId, to: StepId },

    #[error("Step '{0}' is not part of the {1} flow")]
    UnknownStep(StepId, &'static str),

    #[error("Template '{name}' not found. Available templates: {available}")]
    TemplateNotFound { name: String, available: String },

    #[error("Step '{0}' requires a template, but none was selected")]
    MissingTemplate(StepId),

    #[error("Step '{step}' cannot handle a {event} event")]
    UnexpectedEvent { step: StepId, event: &'static str },

    #[error("{label} failed: {message}")]
    TaskFailed { label: &'static str, message: String },
}

/// Errors raised by calls against the Steel API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated. Run `steel login` to store an API key.")]
    NotAuthenticated,

    #[error("Request failed with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid API URL '{0}'")]
    InvalidUrl(String),

    #[error("Missing value for path parameter '{0}'")]
    MissingPathParam(String),

    #[error("Path parameter '{name}' cannot be '{value}'")]
    InvalidPathParam { name: String, value: String },
}
