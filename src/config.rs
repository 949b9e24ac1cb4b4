//! Configuration types for MCQ generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The API credential is resolved once,
//! up front, by [`Credentials::resolve`] and injected into the config; no
//! pipeline stage reads the environment on its own.

use crate::error::McqError;
use crate::pipeline::llm::CompletionBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default completion model (served by Groq).
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Name of the credential in both the secrets file and the environment.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Default secrets file, read relative to the working directory.
pub const DEFAULT_SECRETS_FILE: &str = "secrets.env";

/// Inclusive bounds for the number of questions requested.
pub const MIN_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 30;

/// Configuration for one MCQ generation run.
///
/// # Example
/// ```rust
/// use edgequake_mcq::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .question_count(12)
///     .api_key("gsk_test")
///     .build()
///     .unwrap();
/// assert_eq!(config.question_count, 12);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Number of questions to ask the model for. Range: 5–30. Default: 10.
    pub question_count: u32,

    /// Character budget for the brief text sent to the model. Default: 15000.
    ///
    /// Roughly tracks the model's context ceiling. The cut is a hard
    /// character cut and may land mid-word.
    pub max_chars: usize,

    /// Minimum cleaned text length before a brief is considered readable. Default: 100.
    pub min_text_chars: usize,

    /// Completion model identifier.
    pub model: String,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// API credential for the HTTP backend. `None` means "not configured".
    pub api_key: Option<String>,

    /// Root URL of the OpenAI-compatible completion API.
    pub api_base_url: String,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// When set, the provider is used instead of the HTTP backend.
    pub provider_name: Option<String>,

    /// Pre-constructed backend. Takes precedence over everything else.
    pub backend: Option<Arc<dyn CompletionBackend>>,

    /// Completion call timeout in seconds. Default: none (wait for the transport).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            question_count: 10,
            max_chars: 15_000,
            min_text_chars: 100,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            provider_name: None,
            backend: None,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("question_count", &self.question_count)
            .field("max_chars", &self.max_chars)
            .field("min_text_chars", &self.min_text_chars)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn question_count(mut self, n: u32) -> Self {
        self.config.question_count = n.clamp(MIN_QUESTIONS, MAX_QUESTIONS);
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.max_chars = n;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    /// Set the credential. Blank strings are treated as "no credential".
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = non_blank(key.into());
        self
    }

    /// Set the credential from a [`Credentials::resolve`] result.
    pub fn credentials(mut self, creds: Credentials) -> Self {
        self.config.api_key = creds.api_key;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, McqError> {
        let c = &self.config;
        if c.max_chars == 0 {
            return Err(McqError::InvalidConfig(
                "max_chars must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(McqError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(McqError::InvalidConfig("model must not be empty".into()));
        }
        if !c.api_base_url.starts_with("http://") && !c.api_base_url.starts_with("https://") {
            return Err(McqError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Credentials ──────────────────────────────────────────────────────────

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    SecretsFile,
    Environment,
}

/// The resolved API credential, if any.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub source: Option<CredentialSource>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("source", &self.source)
            .finish()
    }
}

impl Credentials {
    /// Resolve the credential: secrets file first, then the `GROQ_API_KEY`
    /// environment variable.
    ///
    /// A missing secrets file is not an error; an unparseable one is.
    /// The process environment is never modified.
    pub fn resolve(secrets_path: Option<&Path>) -> Result<Self, McqError> {
        let path = secrets_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE));

        if let Some(key) = read_secrets_file(&path)? {
            debug!("API credential loaded from {}", path.display());
            return Ok(Self {
                api_key: Some(key),
                source: Some(CredentialSource::SecretsFile),
            });
        }

        Ok(Self::from_env_value(std::env::var(API_KEY_VAR).ok()))
    }

    fn from_env_value(value: Option<String>) -> Self {
        match value.and_then(non_blank) {
            Some(key) => {
                debug!("API credential loaded from ${}", API_KEY_VAR);
                Self {
                    api_key: Some(key),
                    source: Some(CredentialSource::Environment),
                }
            }
            None => Self::default(),
        }
    }

    pub fn is_present(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Look up [`API_KEY_VAR`] in a dotenv-format secrets file.
fn read_secrets_file(path: &Path) -> Result<Option<String>, McqError> {
    if !path.exists() {
        return Ok(None);
    }
    let unreadable = |detail: String| McqError::SecretsUnreadable {
        path: path.to_path_buf(),
        detail,
    };

    let entries = dotenvy::from_path_iter(path).map_err(|e| unreadable(e.to_string()))?;
    for entry in entries {
        let (key, value) = entry.map_err(|e| unreadable(e.to_string()))?;
        if key == API_KEY_VAR {
            return Ok(non_blank(value));
        }
    }
    Ok(None)
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
