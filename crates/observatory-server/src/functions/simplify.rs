//! `POST /functions/simplify-text`: rewrite an event for casual readers.
//!
//! A stateless proxy to the configured chat-completion API. Callers only
//! ever see the trimmed reply or a generic failure; details go to the log.

use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use observatory_core::config::LlmConfig;
use observatory_types::{EventType, SimplifyTextRequest, SimplifyTextResponse};
use validator::Validate;

use super::FunctionError;
use crate::llm::{LlmBackend, create_backend};
use crate::prompt::{PromptEngine, SimplifyContext};
use crate::state::AppState;

/// Message returned for every upstream failure.
pub const SIMPLIFY_FAILED: &str = "Failed to simplify text";

/// Prompt rendering plus the optional completion backend.
#[derive(Debug)]
pub struct Simplifier {
    backend: Option<LlmBackend>,
    prompts: Option<PromptEngine>,
}

impl Simplifier {
    /// Build from the `llm` config section.
    ///
    /// Misconfiguration is logged, not fatal: the function then answers
    /// every call with a generic failure.
    pub fn from_config(config: &LlmConfig) -> Self {
        let backend = match create_backend(config) {
            Ok(Some(backend)) => {
                tracing::info!(backend = backend.name(), model = %config.model, "text simplification enabled");
                Some(backend)
            }
            Ok(None) => {
                tracing::warn!("LLM API key not set; simplify-text will fail");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to build LLM client");
                None
            }
        };

        let prompts = match config.templates_dir.as_deref() {
            Some(dir) => PromptEngine::from_dir(Path::new(dir)),
            None => PromptEngine::builtin(),
        };
        let prompts = prompts
            .inspect_err(|e| tracing::error!(error = %e, "failed to load prompt templates"))
            .ok();

        Self { backend, prompts }
    }

    /// A simplifier with no backend, for deployments without an API key.
    pub const fn disabled() -> Self {
        Self {
            backend: None,
            prompts: None,
        }
    }

    /// Whether calls can reach a completion API.
    pub const fn is_configured(&self) -> bool {
        self.backend.is_some() && self.prompts.is_some()
    }

    /// Validate a request and rewrite its text.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::Invalid`] for a bad request and another
    /// [`FunctionError`] variant for any upstream failure.
    pub async fn simplify(&self, request: &SimplifyTextRequest) -> Result<String, FunctionError> {
        request
            .validate()
            .map_err(|e| FunctionError::Invalid(e.to_string()))?;
        let event_type: EventType = request
            .event_type
            .parse()
            .map_err(|e: observatory_types::UnknownVariant| FunctionError::Invalid(e.to_string()))?;

        let backend = self
            .backend
            .as_ref()
            .ok_or(FunctionError::NotConfigured("LLM API"))?;
        let prompts = self
            .prompts
            .as_ref()
            .ok_or(FunctionError::NotConfigured("prompt templates"))?;

        let prompt = prompts.render(&SimplifyContext {
            title: &request.title,
            content: &request.content,
            event_type: event_type.as_str(),
        })?;
        let reply = backend.complete(&prompt).await?;
        let simplified = reply.trim();
        if simplified.is_empty() {
            return Err(FunctionError::EmptyReply);
        }
        Ok(simplified.to_owned())
    }
}

/// Handle `POST /functions/simplify-text`.
///
/// Replies `400` for a malformed request, `500` with
/// `{"error": "Failed to simplify text"}` for any upstream failure, and
/// `{"simplified": ...}` otherwise.
pub async fn simplify_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimplifyTextRequest>,
) -> Response {
    match state.simplifier.simplify(&body).await {
        Ok(simplified) => Json(SimplifyTextResponse { simplified }).into_response(),
        Err(FunctionError::Invalid(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": reason })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "simplify-text failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": SIMPLIFY_FAILED })),
            )
                .into_response()
        }
    }
}
