//! Pluggable model backend abstraction
//!
//! The pipeline needs exactly one thing from a model: send a prompt, get text
//! back. Everything else (prompt wording, JSON extraction, fallback) lives in
//! the caller.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OllamaBackend`,
//!   `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::load(None)?;
//! if let Some(client) = AIClient::from_config(&config.ai)? {
//!     let text = client.complete("Categorize ...").await?;
//! }
//! ```

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{AiConfig, BackendKind};
use crate::error::{Error, Result};

/// Trait defining the interface for all model backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one prompt and return the model's raw text output
    ///
    /// Network errors, non-success statuses and empty payloads are all errors.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini `generateContent` API
    Gemini(GeminiBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from configuration
    ///
    /// Returns `Ok(None)` when no backend is configured, or when the configured
    /// backend cannot be used (e.g. Gemini without an API key). The caller then
    /// runs on keyword rules alone.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>> {
        let model = config.effective_model();
        let timeout = Duration::from_secs(config.timeout_secs);

        let host = match (config.backend, config.effective_host()) {
            (BackendKind::None, _) => return Ok(None),
            (BackendKind::Mock, _) => return Ok(Some(AIClient::Mock(MockBackend::new()))),
            (_, Some(host)) => host,
            (backend, None) => {
                return Err(Error::Config(format!("No host configured for {}", backend)))
            }
        };

        let http = http_client(timeout)?;

        let client = match config.backend {
            BackendKind::Gemini => match config.api_key.as_deref() {
                Some(key) => {
                    AIClient::Gemini(GeminiBackend::new(&host, &model, key).with_http_client(http))
                }
                None => {
                    tracing::warn!(
                        "Gemini backend selected but no API key set (TALLY_AI_API_KEY or GEMINI_API_KEY), using keyword rules only"
                    );
                    return Ok(None);
                }
            },
            BackendKind::Ollama => {
                AIClient::Ollama(OllamaBackend::new(&host, &model).with_http_client(http))
            }
            BackendKind::OpenAICompatible => {
                let backend = match config.api_key.as_deref() {
                    Some(key) => OpenAICompatibleBackend::with_api_key(&host, &model, key),
                    None => OpenAICompatibleBackend::new(&host, &model),
                };
                AIClient::OpenAICompatible(backend.with_http_client(http))
            }
            BackendKind::None | BackendKind::Mock => return Ok(None),
        };

        tracing::debug!(backend = %config.backend, host = client.host(), model = client.model(), "Model backend configured");
        Ok(Some(client))
    }

    /// Short backend name for display
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.complete(prompt).await,
            AIClient::Ollama(b) => b.complete(prompt).await,
            AIClient::OpenAICompatible(b) => b.complete(prompt).await,
            AIClient::Mock(b) => b.complete(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// HTTP client shared by the backends, with the configured request timeout
fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Truncate long model output for error messages
pub(crate) fn truncate_raw(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
