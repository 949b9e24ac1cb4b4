//! # edgequake-mcq
//!
//! Generate scenario-based multiple-choice questions from legal briefs.
//!
//! A brief (PDF) is read into plain text, cut to a character budget, and
//! sent to a chat-completion model with instructions to write numbered
//! questions in a fixed layout. The model's free-text answer is then parsed
//! back into structured [`QuestionRecord`]s that can be shown on a terminal
//! or exported as Markdown.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     read local file or download from URL, check %PDF magic
//!  ├─ 2. Extract   page text via pdfium, pdf-extract fallback (spawn_blocking)
//!  ├─ 3. Normalise collapse whitespace, cut to max_chars
//!  ├─ 4. Complete  one chat-completion call (Groq by default)
//!  ├─ 5. Parse     numbered blocks → QuestionRecord (malformed blocks reported)
//!  └─ 6. Export    terminal view, mcqs.md / mcqs.txt
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_mcq::{generate, Credentials, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GROQ_API_KEY from ./secrets.env, else from the environment
//!     let creds = Credentials::resolve(None)?;
//!     let config = GenerationConfig::builder()
//!         .credentials(creds)
//!         .question_count(10)
//!         .build()?;
//!     let output = generate("brief.pdf", &config).await?;
//!     if output.is_fallback() {
//!         println!("{}", output.raw_output);
//!     } else {
//!         print!("{}", edgequake_mcq::render_markdown(&output.questions));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing without a model
//!
//! ```rust
//! let raw = "1. A tenant is evicted without notice.\n\
//!            A) Valid\nB) Invalid\nC) Unclear\nD) None\n\
//!            Correct Answer: B\nExplanation: Due process requires notice.";
//! let questions = edgequake_mcq::parse_mcqs(raw);
//! assert_eq!(questions.len(), 1);
//! assert_eq!(questions[0].answer, "B");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2mcq` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-mcq = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CredentialSource, Credentials, GenerationConfig, GenerationConfigBuilder};
pub use error::{McqError, RejectReason, RejectedBlock};
pub use generate::{generate, generate_from_bytes, generate_sync, generate_to_files};
pub use output::{GenerationOutput, GenerationStats, ParseReport, QuestionRecord};
pub use pipeline::export::{render_markdown, render_terminal, write_exports, ExportFormat};
pub use pipeline::llm::{CompletionBackend, CompletionSettings};
pub use pipeline::parse::{parse_mcqs, parse_report};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
