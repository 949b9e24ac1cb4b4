//! End-to-end generation entry points.
//!
//! One run is strictly sequential: the brief is read and extracted, a
//! single completion is requested, and the answer is parsed. There is no
//! retry; a failed call is reported and the caller decides what to do.

use crate::config::GenerationConfig;
use crate::error::McqError;
use crate::output::{GenerationOutput, GenerationStats};
use crate::pipeline::extract::{self, ExtractedText};
use crate::pipeline::llm::{self, CompletionBackend, CompletionSettings};
use crate::pipeline::{export, input, normalize, parse};
use crate::progress::Stage;
use crate::prompts;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate MCQs from a PDF file path or HTTP/HTTPS URL.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(GenerationOutput)` whenever the model answered, even if nothing
/// parsed (check [`GenerationOutput::is_fallback`]).
///
/// # Errors
/// Returns `Err(McqError)` only for fatal errors:
/// - no credential or provider (checked before any network traffic)
/// - file not found / not a PDF / download failure
/// - unreadable or near-empty text
/// - completion API failure or empty completion
pub async fn generate(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, McqError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting generation: {}", input_str);

    let backend = llm::resolve_backend(config)?;
    let pdf = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run(pdf, backend.as_ref(), config, total_start).await
}

/// Generate MCQs from PDF bytes already in memory.
///
/// # Example
/// ```rust,no_run
/// use edgequake_mcq::{generate_from_bytes, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("brief.pdf")?;
/// let config = GenerationConfig::builder().api_key("gsk_...").build()?;
/// let output = generate_from_bytes(&bytes, &config).await?;
/// println!("{} questions", output.questions.len());
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_bytes(
    bytes: &[u8],
    config: &GenerationConfig,
) -> Result<GenerationOutput, McqError> {
    let total_start = Instant::now();
    let backend = llm::resolve_backend(config)?;
    let pdf = input::from_bytes("<memory>", bytes.to_vec())?;
    run(pdf, backend.as_ref(), config, total_start).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, McqError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| McqError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input_str, config))
}

/// Generate MCQs and write `mcqs.md` / `mcqs.txt` into `output_dir`.
///
/// Files are only written when at least one question parsed; the returned
/// path list is empty otherwise.
pub async fn generate_to_files(
    input_str: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<(GenerationOutput, Vec<PathBuf>), McqError> {
    let output = generate(input_str, config).await?;
    let paths = export_output(&output, output_dir.as_ref()).await?;
    Ok((output, paths))
}

/// Write the parsed questions of `output` into `dir`, unless it is a
/// raw-output fallback, in which case nothing is written.
async fn export_output(
    output: &GenerationOutput,
    dir: &Path,
) -> Result<Vec<PathBuf>, McqError> {
    if output.is_fallback() {
        warn!("No questions parsed; skipping export");
        return Ok(Vec::new());
    }

    let dir = dir.to_path_buf();
    let records = output.questions.clone();
    tokio::task::spawn_blocking(move || {
        export::write_exports(&dir, export::DEFAULT_STEM, &records)
    })
    .await
    .map_err(|e| McqError::Internal(format!("Export task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    pdf: input::PdfInput,
    backend: &dyn CompletionBackend,
    config: &GenerationConfig,
    total_start: Instant,
) -> Result<GenerationOutput, McqError> {
    stage_start(config, Stage::Extracting);
    let extract_start = Instant::now();
    debug!("Extracting text from {} ({} bytes)", pdf.name, pdf.bytes.len());
    let extracted = extract::extract_text(pdf.bytes).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    generate_from_extracted(extracted, extract_duration_ms, backend, config, total_start).await
}

/// Everything after extraction: normalise, prompt, complete, parse.
async fn generate_from_extracted(
    extracted: ExtractedText,
    extract_duration_ms: u64,
    backend: &dyn CompletionBackend,
    config: &GenerationConfig,
    total_start: Instant,
) -> Result<GenerationOutput, McqError> {
    let (text, extracted_chars) = normalize::normalize(&extracted.text, config.max_chars);
    let sent_chars = text.chars().count();
    if sent_chars < config.min_text_chars {
        return Err(McqError::InsufficientText {
            chars: sent_chars,
            min: config.min_text_chars,
        });
    }
    let truncated = sent_chars < extracted_chars;
    if truncated {
        info!(
            "Truncated brief from {} to {} chars",
            extracted_chars, sent_chars
        );
    }
    stage_complete(
        config,
        Stage::Extracting,
        &format!("{} chars via {}", extracted_chars, extracted.strategy.name()),
    );

    // ── Completion ───────────────────────────────────────────────────────
    stage_start(config, Stage::Generating);
    let prompt = prompts::build_prompt(&text, config.question_count);
    let settings = CompletionSettings::from_config(config);
    let llm_start = Instant::now();
    let raw_output = llm::complete(backend, &prompt, &settings, config.api_timeout_secs)
        .await?
        .ok_or(McqError::EmptyCompletion)?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    stage_complete(
        config,
        Stage::Generating,
        &format!("{} chars in {}ms", raw_output.chars().count(), llm_duration_ms),
    );

    // ── Parsing ──────────────────────────────────────────────────────────
    stage_start(config, Stage::Parsing);
    let report = parse::parse_report(&raw_output);
    stage_complete(
        config,
        Stage::Parsing,
        &format!(
            "{} parsed, {} rejected",
            report.questions.len(),
            report.rejected.len()
        ),
    );
    if report.is_empty() {
        warn!("Could not parse any MCQs from the model output");
    }

    let stats = GenerationStats {
        strategy: extracted.strategy,
        extracted_chars,
        sent_chars,
        truncated,
        requested_questions: config.question_count,
        extract_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Generation complete: {}/{} questions, {}ms total",
        report.questions.len(),
        config.question_count,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(report.questions.len());
    }

    Ok(GenerationOutput {
        questions: report.questions,
        raw_output,
        rejected: report.rejected,
        noise_blocks: report.noise_blocks,
        stats,
    })
}

fn stage_start(config: &GenerationConfig, stage: Stage) {
    info!("{}", stage.label());
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &GenerationConfig, stage: Stage, detail: &str) {
    debug!("{:?} done: {}", stage, detail);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::ExtractionStrategy;
    use crate::progress::GenerationProgressCallback;
    use futures::future::BoxFuture;
    use std::sync::{Arc, Mutex};

    const TENANT: &str = "1. A tenant is evicted without notice.\nA) Valid\nB) Invalid\nC) Unclear\nD) None\nCorrect Answer: B\nExplanation: Due process requires notice.";

    /// Returns a canned completion and records the prompt it was given.
    struct StubBackend {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubBackend {
        fn new(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        fn complete<'a>(
            &'a self,
            prompt: &'a str,
            _settings: &'a CompletionSettings,
        ) -> BoxFuture<'a, Result<Option<String>, McqError>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = self.reply.clone();
            Box::pin(async move { Ok(reply) })
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {:?}", stage));
        }
        fn on_stage_complete(&self, stage: Stage, _detail: &str) {
            self.events.lock().unwrap().push(format!("done {:?}", stage));
        }
        fn on_generation_complete(&self, n: usize) {
            self.events.lock().unwrap().push(format!("complete {}", n));
        }
    }

    fn brief(chars: usize) -> ExtractedText {
        ExtractedText {
            text: "The  petitioner\nwas detained. ".repeat(chars / 28 + 1),
            strategy: ExtractionStrategy::Pdfium,
        }
    }

    async fn run_stub(
        extracted: ExtractedText,
        backend: &StubBackend,
        config: &GenerationConfig,
    ) -> Result<GenerationOutput, McqError> {
        generate_from_extracted(extracted, 0, backend, config, Instant::now()).await
    }

    #[tokio::test]
    async fn tenant_reply_becomes_one_question() {
        let backend = StubBackend::new(Some(TENANT));
        let config = GenerationConfig::default();
        let out = run_stub(brief(500), &backend, &config).await.unwrap();

        assert_eq!(out.questions.len(), 1);
        assert_eq!(out.questions[0].answer, "B");
        assert!(!out.is_fallback());
        assert_eq!(out.raw_output, TENANT);
        assert_eq!(out.stats.requested_questions, 10);
    }

    #[tokio::test]
    async fn prompt_carries_count_and_normalised_text() {
        let backend = StubBackend::new(Some(TENANT));
        let config = GenerationConfig::builder().question_count(7).build().unwrap();
        run_stub(brief(500), &backend, &config).await.unwrap();

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Generate 7 MCQs"));
        assert!(prompts[0].contains("The petitioner was detained."));
        assert!(!prompts[0].contains("petitioner\nwas"));
    }

    #[tokio::test]
    async fn long_brief_is_truncated_to_budget() {
        let backend = StubBackend::new(Some(TENANT));
        let config = GenerationConfig::builder().max_chars(200).build().unwrap();
        let out = run_stub(brief(5_000), &backend, &config).await.unwrap();

        assert!(out.stats.truncated);
        assert_eq!(out.stats.sent_chars, 200);
        assert!(out.stats.extracted_chars > 200);
    }

    #[tokio::test]
    async fn short_text_is_insufficient_and_skips_the_model() {
        let backend = StubBackend::new(Some(TENANT));
        let config = GenerationConfig::default();
        let extracted = ExtractedText {
            text: "  Scanned page  ".into(),
            strategy: ExtractionStrategy::PdfExtract,
        };
        let err = run_stub(extracted, &backend, &config).await.unwrap_err();

        assert!(matches!(
            err,
            McqError::InsufficientText { chars: 12, min: 100 }
        ));
        assert!(backend.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn budget_below_minimum_is_insufficient() {
        let backend = StubBackend::new(Some(TENANT));
        let config = GenerationConfig::builder().max_chars(50).build().unwrap();
        let err = run_stub(brief(5_000), &backend, &config).await.unwrap_err();

        assert!(matches!(
            err,
            McqError::InsufficientText { chars: 50, min: 100 }
        ));
        assert!(backend.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_completion_is_an_error() {
        let config = GenerationConfig::default();
        for reply in [None, Some(""), Some("  \n ")] {
            let backend = StubBackend::new(reply);
            let err = run_stub(brief(500), &backend, &config).await.unwrap_err();
            assert!(matches!(err, McqError::EmptyCompletion), "reply {reply:?}");
        }
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_to_raw_output() {
        let reply = "I'm sorry, I cannot produce questions from this text.";
        let backend = StubBackend::new(Some(reply));
        let out = run_stub(brief(500), &backend, &GenerationConfig::default())
            .await
            .unwrap();

        assert!(out.is_fallback());
        assert_eq!(out.raw_output, reply);
        assert_eq!(out.rejected.len(), 1);
    }

    #[tokio::test]
    async fn progress_events_follow_stage_order() {
        let recorder = Arc::new(Recorder::default());
        let config = GenerationConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let backend = StubBackend::new(Some(TENANT));
        run_stub(brief(500), &backend, &config).await.unwrap();

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "done Extracting",
                "start Generating",
                "done Generating",
                "start Parsing",
                "done Parsing",
                "complete 1",
            ]
        );
    }

    #[tokio::test]
    async fn missing_credential_fails_before_reading_input() {
        let config = GenerationConfig::default();
        let err = generate("/definitely/not/here.pdf", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, McqError::MissingCredential));
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_rejected() {
        let config = GenerationConfig::builder()
            .backend(Arc::new(StubBackend::new(Some(TENANT))))
            .build()
            .unwrap();
        let err = generate_from_bytes(b"PK\x03\x04zip", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, McqError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn failed_run_writes_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig::builder()
            .backend(Arc::new(StubBackend::new(Some(TENANT))))
            .build()
            .unwrap();
        // Input resolution fails first, so no files may appear.
        let result = generate_to_files("/definitely/not/here.pdf", dir.path(), &config).await;
        assert!(matches!(result, Err(McqError::FileNotFound { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn parsed_output_is_exported_as_markdown_and_text() {
        let backend = StubBackend::new(Some(TENANT));
        let out = run_stub(brief(500), &backend, &GenerationConfig::default())
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let paths = export_output(&out, dir.path()).await.unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("mcqs.md"), dir.path().join("mcqs.txt")]
        );
        let md = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(md.contains("A tenant is evicted without notice."));
        assert_eq!(std::fs::read_to_string(&paths[1]).unwrap(), md);
    }

    #[tokio::test]
    async fn fallback_output_writes_no_files() {
        let backend = StubBackend::new(Some("I cannot help with that brief, sorry."));
        let out = run_stub(brief(500), &backend, &GenerationConfig::default())
            .await
            .unwrap();
        assert!(out.is_fallback());
        let dir = tempfile::tempdir().unwrap();

        let paths = export_output(&out, dir.path()).await.unwrap();
        assert!(paths.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
