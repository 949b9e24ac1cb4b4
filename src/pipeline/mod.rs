//! Pipeline stages for PDF-to-MCQ generation.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested without the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ llm ──▶ parse ──▶ export
//! (path/URL) (pdfium)   (clean+cut)  (chat)  (grammar) (md/txt)
//! ```
//!
//! 1. [`input`]     — read a local file or download a URL into memory and
//!    check the `%PDF` magic
//! 2. [`extract`]   — page text via pdfium, falling back to pdf-extract;
//!    runs in `spawn_blocking`
//! 3. [`normalize`] — collapse whitespace and cut to the character budget
//! 4. [`llm`]       — the single completion call; the only stage with
//!    network I/O after input
//! 5. [`parse`]     — split raw model text into blocks and fold each block
//!    into a question record
//! 6. [`export`]    — terminal rendering and the Markdown/text downloads
//!
//! Prompt text lives in [`crate::prompts`].

pub mod export;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod parse;
