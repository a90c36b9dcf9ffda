//! Chat-completion backends for the simplify-text function.
//!
//! Enum dispatch over the two request formats the Observatory speaks,
//! since async methods are not dyn-compatible. Both send one system
//! message and one user message and return the first text block of the
//! reply.

use std::time::Duration;

use observatory_core::config::{LlmBackendKind, LlmConfig};

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Errors from a completion call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP client could not be built or the request failed in transit.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for logs only.
        body: String,
    },

    /// The response did not contain the expected text field.
    #[error("response missing {0}")]
    MissingContent(&'static str),
}

/// A system + user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    /// Fixed instructions.
    pub system: String,
    /// Rendered request.
    pub user: String,
}

/// Connection and sampling settings shared by both backends.
#[derive(Debug, Clone)]
struct Endpoint {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl Endpoint {
    fn new(config: &LlmConfig, api_key: &str) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

/// A chat-completion backend.
#[derive(Debug, Clone)]
pub enum LlmBackend {
    /// `OpenAI`-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the call fails or the reply has no text.
    pub async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt).await,
            Self::Anthropic(backend) => backend.complete(prompt).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for `OpenAI`-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    endpoint: Endpoint,
}

impl OpenAiBackend {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
        let ep = &self.endpoint;
        let url = format!("{}/chat/completions", ep.api_url);
        let body = serde_json::json!({
            "model": ep.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "max_tokens": ep.max_tokens,
            "temperature": ep.temperature,
        });

        let response = ep
            .client
            .post(&url)
            .bearer_auth(&ep.api_key)
            .json(&body)
            .send()
            .await?;
        let json = read_json(response).await?;
        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or(LlmError::MissingContent("choices[0].message.content"))
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Uses the `x-api-key` header, a top-level `system` field, and reads
/// `content[0].text` from the reply.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    endpoint: Endpoint,
}

impl AnthropicBackend {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
        let ep = &self.endpoint;
        let url = format!("{}/messages", ep.api_url);
        let body = serde_json::json!({
            "model": ep.model,
            "max_tokens": ep.max_tokens,
            "temperature": ep.temperature,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });

        let response = ep
            .client
            .post(&url)
            .header("x-api-key", &ep.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let json = read_json(response).await?;
        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or(LlmError::MissingContent("content[0].text"))
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create a backend from configuration. Returns `Ok(None)` when no API key
/// is configured.
///
/// # Errors
///
/// Returns [`LlmError::Request`] if the HTTP client cannot be built.
pub fn create_backend(config: &LlmConfig) -> Result<Option<LlmBackend>, LlmError> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    let endpoint = Endpoint::new(config, api_key)?;
    Ok(Some(match config.backend {
        LlmBackendKind::OpenAi => LlmBackend::OpenAi(OpenAiBackend { endpoint }),
        LlmBackendKind::Anthropic => LlmBackend::Anthropic(AnthropicBackend { endpoint }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{"message": {"content": "Two villages made peace."}}]
        });
        assert_eq!(
            extract_openai_content(&json).ok().as_deref(),
            Some("Two villages made peace.")
        );
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(matches!(
            extract_openai_content(&json),
            Err(LlmError::MissingContent(_))
        ));
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{"type": "text", "text": "A storm hit the coast."}]
        });
        assert_eq!(
            extract_anthropic_content(&json).ok().as_deref(),
            Some("A storm hit the coast.")
        );
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[test]
    fn no_key_means_no_backend() {
        let config = LlmConfig::default();
        assert!(matches!(create_backend(&config), Ok(None)));

        let config = LlmConfig {
            api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        assert!(matches!(create_backend(&config), Ok(None)));
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let openai = LlmConfig {
            api_key: Some("test".to_owned()),
            ..LlmConfig::default()
        };
        let backend = create_backend(&openai).ok().flatten();
        assert_eq!(backend.as_ref().map(LlmBackend::name), Some("openai-compatible"));

        let anthropic = LlmConfig {
            backend: LlmBackendKind::Anthropic,
            api_url: "https://api.anthropic.com/v1/".to_owned(),
            api_key: Some("test".to_owned()),
            ..LlmConfig::default()
        };
        let backend = create_backend(&anthropic).ok().flatten();
        assert_eq!(backend.as_ref().map(LlmBackend::name), Some("anthropic"));
    }
}
