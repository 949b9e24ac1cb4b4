//! Completion call: send the prompt, get the model's text back.
//!
//! One request, no retry, no streaming. All prompt wording lives in
//! [`crate::prompts`]; this module only moves bytes and classifies errors.
//!
//! ## Backends
//!
//! [`CompletionBackend`] is the seam between the pipeline and a model:
//!
//! - [`GroqClient`] — OpenAI-compatible `POST /chat/completions` over
//!   `reqwest`, with the credential injected at construction. This is the
//!   default backend.
//! - [`ProviderBackend`] — any `edgequake_llm::LLMProvider` (OpenAI,
//!   Anthropic, Gemini, Ollama, …), reading its key from the environment
//!   the way `ProviderFactory` does.
//!
//! Callers can also hand a pre-built backend to
//! [`crate::config::GenerationConfigBuilder::backend`]; tests use this.

use crate::config::GenerationConfig;
use crate::error::McqError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sampling settings for one completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl CompletionSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A text-completion service.
///
/// `complete` returns `Ok(None)` when the service answered without any
/// text content; transport and API failures are `Err`.
pub trait CompletionBackend: Send + Sync {
    /// Short name for logs and error messages.
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        settings: &'a CompletionSettings,
    ) -> BoxFuture<'a, Result<Option<String>, McqError>>;
}

/// Pick the backend for `config`, from most-specific to least-specific:
///
/// 1. a pre-built backend (`config.backend`);
/// 2. a named edgequake-llm provider (`config.provider_name`);
/// 3. the HTTP backend with `config.api_key`.
///
/// Step 3 fails with [`McqError::MissingCredential`] when no key was
/// resolved, so callers can check credentials before any network traffic.
pub fn resolve_backend(config: &GenerationConfig) -> Result<Arc<dyn CompletionBackend>, McqError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if let Some(ref name) = config.provider_name {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            McqError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        })?;
        return Ok(Arc::new(ProviderBackend::new(name.clone(), provider)));
    }

    if config.api_key.is_none() {
        warn!("No API credential configured; refusing to build the HTTP backend");
        return Err(McqError::MissingCredential);
    }
    let client = GroqClient::new(config.api_key.clone(), config.api_base_url.clone())?;
    Ok(Arc::new(client))
}

/// Run one completion, trimming the result and applying the optional timeout.
///
/// Whitespace-only content is treated the same as no content.
pub async fn complete(
    backend: &dyn CompletionBackend,
    prompt: &str,
    settings: &CompletionSettings,
    timeout_secs: Option<u64>,
) -> Result<Option<String>, McqError> {
    info!(
        "Requesting completion from {} (model={}, prompt={} chars)",
        backend.name(),
        settings.model,
        prompt.chars().count()
    );

    let call = backend.complete(prompt, settings);
    let content = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| McqError::ApiTimeout { secs })??,
        None => call.await?,
    };

    Ok(content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty()))
}

// ── HTTP backend ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// OpenAI-compatible chat-completions client (Groq by default).
pub struct GroqClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GroqClient {
    /// Create a client. A `None` credential is accepted here and reported
    /// by [`CompletionBackend::complete`], so construction never fails on it.
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self, McqError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| McqError::Internal(format!("HTTP client: {e}")))?;
        let base = base_url.into();
        Ok(Self {
            http,
            api_key,
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, prompt: &str, settings: &CompletionSettings) -> Result<Option<String>, McqError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No API credential configured; skipping completion call");
            return Err(McqError::MissingCredential);
        };

        let body = ChatRequest {
            model: &settings.model,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| McqError::LlmApiError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), detail, retry_after));
        }

        let text = response.text().await.map_err(|e| McqError::LlmApiError {
            message: e.to_string(),
        })?;
        parse_response(&text)
    }
}

impl CompletionBackend for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        settings: &'a CompletionSettings,
    ) -> BoxFuture<'a, Result<Option<String>, McqError>> {
        Box::pin(self.send(prompt, settings))
    }
}

/// Map a non-2xx status to the matching error variant.
fn classify_status(status: u16, detail: String, retry_after_secs: Option<u64>) -> McqError {
    match status {
        401 | 403 => McqError::AuthError {
            provider: "groq".to_string(),
            detail,
        },
        429 => McqError::RateLimitExceeded {
            provider: "groq".to_string(),
            retry_after_secs,
        },
        _ => McqError::LlmApiError {
            message: format!("HTTP {status}: {detail}"),
        },
    }
}

/// Pull the first choice's content out of a chat-completions body.
fn parse_response(body: &str) -> Result<Option<String>, McqError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| McqError::LlmApiError {
        message: format!("unreadable response body: {e}"),
    })?;

    if let Some(ref usage) = parsed.usage {
        debug!(
            "{} input tokens, {} output tokens",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content))
}

// ── edgequake-llm backend ────────────────────────────────────────────────

/// Adapter from an `edgequake_llm::LLMProvider` to [`CompletionBackend`].
pub struct ProviderBackend {
    name: String,
    provider: Arc<dyn LLMProvider>,
}

impl ProviderBackend {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

impl CompletionBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        settings: &'a CompletionSettings,
    ) -> BoxFuture<'a, Result<Option<String>, McqError>> {
        Box::pin(async move {
            let messages = vec![ChatMessage::user(prompt)];
            let options = CompletionOptions {
                temperature: Some(settings.temperature),
                max_tokens: Some(settings.max_tokens),
                ..Default::default()
            };

            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| McqError::LlmApiError {
                    message: format!("{}: {}", self.name, e),
                })?;

            debug!(
                "{}: {} input tokens, {} output tokens",
                self.name, response.prompt_tokens, response.completion_tokens
            );
            Ok(Some(response.content))
        })
    }
}
