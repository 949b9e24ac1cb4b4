//! PDF text extraction with a two-strategy fallback.
//!
//! ## Strategies
//!
//! 1. **pdfium** (`pdfium-render`) — best reading order, but needs a
//!    `libpdfium` shared library at runtime. Binding is tried at
//!    `$PDFIUM_LIB_PATH`, then `./`, then the system library path.
//! 2. **pdf-extract** — pure Rust, always available, weaker on complex
//!    layouts. It can panic on malformed input, so calls are wrapped in
//!    `catch_unwind` and panics become errors.
//!
//! The fallback is taken only when pdfium *raises*. A document that loads
//! but holds no text (a scanned brief) yields an empty string from pdfium
//! and is not retried; the orchestrator's minimum-length check reports it.

use crate::error::McqError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Which extractor produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStrategy {
    Pdfium,
    PdfExtract,
}

impl ExtractionStrategy {
    pub fn name(self) -> &'static str {
        match self {
            ExtractionStrategy::Pdfium => "pdfium",
            ExtractionStrategy::PdfExtract => "pdf-extract",
        }
    }
}

/// Raw extracted text, all pages concatenated in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub strategy: ExtractionStrategy,
}

/// Extract text from PDF bytes.
///
/// Runs inside `spawn_blocking`: both extractors are CPU-bound and pdfium
/// is not async-safe.
pub async fn extract_text(bytes: Vec<u8>) -> Result<ExtractedText, McqError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
        .await
        .map_err(|e| McqError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_text`].
pub fn extract_text_blocking(bytes: &[u8]) -> Result<ExtractedText, McqError> {
    extract_with(bytes, extract_with_pdfium, extract_with_pdf_extract)
}

/// Run `primary`; on error, run `fallback` over the same bytes from the start.
fn extract_with<P, F>(bytes: &[u8], primary: P, fallback: F) -> Result<ExtractedText, McqError>
where
    P: FnOnce(&[u8]) -> Result<String, String>,
    F: FnOnce(&[u8]) -> Result<String, String>,
{
    let primary_err = match primary(bytes) {
        Ok(text) => {
            info!("Extracted {} chars via pdfium", text.chars().count());
            return Ok(ExtractedText {
                text,
                strategy: ExtractionStrategy::Pdfium,
            });
        }
        Err(e) => e,
    };

    warn!("pdfium extraction failed ({}); falling back to pdf-extract", primary_err);

    match fallback(bytes) {
        Ok(text) => {
            info!("Extracted {} chars via pdf-extract", text.chars().count());
            Ok(ExtractedText {
                text,
                strategy: ExtractionStrategy::PdfExtract,
            })
        }
        Err(fallback_err) => Err(McqError::ExtractionFailed {
            primary: primary_err,
            fallback: fallback_err,
        }),
    }
}

// ── pdfium ───────────────────────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, String> {
    let from_env = std::env::var("PDFIUM_LIB_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map(|p| Pdfium::bind_to_library(p).map_err(|e| e.to_string()));

    let bindings = match from_env {
        Some(Ok(b)) => b,
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| format!("failed to bind libpdfium: {}", e))?,
    };

    Ok(Pdfium::new(bindings))
}

fn extract_with_pdfium(bytes: &[u8]) -> Result<String, String> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| format!("failed to load document: {}", e))?;

    let pages: Vec<String> = document
        .pages()
        .iter()
        .enumerate()
        .map(|(idx, page)| match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                debug!("Page {}: no text layer ({})", idx + 1, e);
                String::new()
            }
        })
        .collect();

    debug!("pdfium read {} pages", pages.len());
    Ok(pages.join("\n"))
}

// ── pdf-extract ──────────────────────────────────────────────────────────

fn extract_with_pdf_extract(bytes: &[u8]) -> Result<String, String> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => {
            debug!("pdf-extract read {} pages", pages.len());
            Ok(pages.join("\n"))
        }
        Ok(Err(e)) => Err(format!("extraction failed: {}", e)),
        Err(_) => Err("extraction panicked (malformed document)".to_string()),
    }
}
