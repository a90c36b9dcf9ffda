//! The two backend functions the dashboard calls directly.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/functions/verify-admin-password` | Check the admin password, issue a token |
//! | `POST` | `/functions/simplify-text` | Rewrite an event in plain language |
//!
//! Unlike the read API these reply with the flat bodies from
//! [`observatory_types::functions`] rather than `{error, status}`.

pub mod admin_auth;
pub mod simplify;

use crate::llm::LlmError;
use crate::prompt::PromptError;

/// Errors raised inside a backend function.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// The request body failed validation.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The function has no backend configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The completion API call failed.
    #[error("completion failed: {0}")]
    Llm(#[from] LlmError),

    /// The prompt could not be rendered.
    #[error("prompt failed: {0}")]
    Prompt(#[from] PromptError),

    /// The completion API returned only whitespace.
    #[error("completion was empty")]
    EmptyReply,
}
