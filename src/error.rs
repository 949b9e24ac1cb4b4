//! Error types for the edgequake-mcq library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`McqError`] — **Fatal**: the generation cannot proceed at all
//!   (bad input file, no API credential, completion call failed). Returned
//!   as `Err(McqError)` from the top-level `generate*` functions.
//!
//! * [`RejectedBlock`] — **Non-fatal**: one block of model output could not
//!   be turned into a question, but every other block is fine. Collected in
//!   [`crate::output::ParseReport`] so callers can see how many blocks were
//!   dropped and why, without losing the questions that did parse.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-mcq library.
///
/// Block-level parse failures use [`RejectedBlock`] and are reported in
/// [`crate::output::ParseReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum McqError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Both extraction strategies raised an error.
    #[error("Text extraction failed.\n  pdfium: {primary}\n  pdf-extract: {fallback}")]
    ExtractionFailed { primary: String, fallback: String },

    /// Extraction "worked" but produced too little text to build questions from.
    #[error(
        "Failed to extract sufficient text from the PDF ({chars} chars, need at least {min}).\n\
         Scanned or image-only briefs are not supported."
    )]
    InsufficientText { chars: usize, min: usize },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No API credential in the secrets file or the environment.
    #[error(
        "No API credential configured.\n\
         Set GROQ_API_KEY in your secrets file or in the environment."
    )]
    MissingCredential,

    /// A named edgequake-llm provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion API returned an error or an unreadable body.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The completion API rejected the credential (401/403).
    #[error("Authentication error from '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The completion API returned HTTP 429.
    #[error("Rate limit exceeded for '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The completion call exceeded `api_timeout_secs`.
    #[error("API call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// The completion API answered, but with no text content.
    #[error("Failed to generate MCQs: the model returned no content. Please try again.")]
    EmptyCompletion,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The secrets file exists but could not be parsed.
    #[error("Failed to read secrets file '{path}': {detail}")]
    SecretsUnreadable { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McqError {
    /// True for errors caused by configuration rather than input or network.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            McqError::MissingCredential
                | McqError::ProviderNotConfigured { .. }
                | McqError::InvalidConfig(_)
                | McqError::SecretsUnreadable { .. }
        )
    }
}

/// Why a block of model output did not become a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// An answer line was found but no option lines.
    MissingOptions,
    /// Option lines were found but no `Correct Answer:` line.
    MissingAnswer,
    /// Neither options nor an answer (typically a preamble paragraph).
    MissingBoth,
}

/// A non-fatal parse failure for a single block.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Block {index}: {reason:?} ({excerpt:?})")]
pub struct RejectedBlock {
    /// 0-based position of the block in the raw output.
    pub index: usize,
    pub reason: RejectReason,
    /// First characters of the block, for diagnostics.
    pub excerpt: String,
}
