//! CLI binary for edgequake-mcq.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_mcq::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use edgequake_mcq::{
    generate, render_terminal, write_exports, Credentials, GenerationConfig, GenerationOutput,
    GenerationProgressCallback, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the
/// pipeline stage, plus a log line as each stage finishes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(stage.label());
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar.println(format!(
            "  {} {:<11} {}",
            green("✓"),
            format!("{:?}", stage),
            dim(detail)
        ));
    }

    fn on_generation_complete(&self, _question_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ten questions from a local brief
  pdf2mcq brief.pdf

  # Twenty questions, exported to ./out/mcqs.md and ./out/mcqs.txt
  pdf2mcq -n 20 -o out brief.pdf

  # From a URL, JSON output
  pdf2mcq --json https://example.org/briefs/olga-tellis.pdf > mcqs.json

  # Any edgequake-llm provider instead of Groq
  pdf2mcq --provider openai --model gpt-4.1-mini brief.pdf

CREDENTIALS:
  GROQ_API_KEY is read from the secrets file (default ./secrets.env,
  dotenv format), then from the environment. --api-key overrides both.
  With --provider, the provider's own variable is used (OPENAI_API_KEY, …).

ENVIRONMENT VARIABLES:
  GROQ_API_KEY            Groq API key
  PDFIUM_LIB_PATH         Path to libpdfium (falls back to ./ and the system path;
                          without pdfium, the built-in pdf-extract reader is used)
  RUST_LOG                Log filter override (e.g. edgequake_mcq=debug)
"#;

/// Generate scenario-based MCQs from a legal brief.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2mcq",
    version,
    about = "Generate scenario-based multiple-choice questions from a legal brief PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Number of questions to generate (5–30).
    #[arg(short = 'n', long, env = "PDF2MCQ_QUESTIONS", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(5..=30))]
    questions: u32,

    /// Completion model ID.
    #[arg(long, env = "PDF2MCQ_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// edgequake-llm provider (openai, anthropic, gemini, ollama, …) instead of Groq.
    #[arg(long, env = "PDF2MCQ_PROVIDER")]
    provider: Option<String>,

    /// API key; overrides the secrets file and GROQ_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Dotenv-format secrets file holding GROQ_API_KEY.
    #[arg(long, env = "PDF2MCQ_SECRETS", default_value = "secrets.env")]
    secrets: PathBuf,

    /// Base URL of the OpenAI-compatible completion API.
    #[arg(long, env = "PDF2MCQ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDF2MCQ_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, env = "PDF2MCQ_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Character budget for brief text sent to the model.
    #[arg(long, env = "PDF2MCQ_MAX_CHARS", default_value_t = 15_000)]
    max_chars: usize,

    /// Write mcqs.md and mcqs.txt into this directory.
    #[arg(short, long, env = "PDF2MCQ_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Output structured JSON (GenerationOutput) instead of text.
    #[arg(long, env = "PDF2MCQ_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "PDF2MCQ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MCQ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "PDF2MCQ_QUIET")]
    quiet: bool,

    /// Completion call timeout in seconds (default: no timeout).
    #[arg(long, env = "PDF2MCQ_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2MCQ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so library INFO logs
    // are suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run generation ───────────────────────────────────────────────────
    let output = generate(&cli.input, &config)
        .await
        .context("Failed to generate MCQs")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_output(&output, cli.quiet);
    }

    if let Some(ref dir) = cli.output_dir {
        if output.is_fallback() {
            eprintln!("{} Nothing to export", yellow("⚠"));
        } else {
            let paths = write_exports(dir, "mcqs", &output.questions)
                .with_context(|| format!("Failed to export to {}", dir.display()))?;
            if !cli.quiet {
                for p in paths {
                    eprintln!("{} {}", green("✔"), bold(&p.display().to_string()));
                }
            }
        }
    }

    Ok(())
}

/// Print questions, or the raw model output when nothing parsed.
fn print_output(output: &GenerationOutput, quiet: bool) {
    if output.is_fallback() {
        eprintln!(
            "{} Could not parse MCQs. Showing raw output:",
            yellow("⚠")
        );
        println!("{}", output.raw_output);
        return;
    }

    println!("{}\n", bold(&format!("{} MCQs Generated:", output.questions.len())));
    print!("{}", render_terminal(&output.questions));

    if !quiet {
        if !output.rejected.is_empty() {
            eprintln!(
                "{} {} blocks could not be parsed",
                yellow("⚠"),
                output.rejected.len()
            );
        }
        let stats = &output.stats;
        eprintln!(
            "{}",
            dim(&format!(
                "{} chars via {}{}  ·  {}ms total",
                stats.sent_chars,
                stats.strategy.name(),
                if stats.truncated { " (truncated)" } else { "" },
                stats.total_duration_ms
            ))
        );
    }
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .question_count(cli.questions)
        .model(cli.model.clone())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_chars(cli.max_chars)
        .api_base_url(cli.base_url.clone())
        .download_timeout_secs(cli.download_timeout);

    builder = match cli.api_key {
        Some(ref key) => builder.api_key(key.clone()),
        None => builder.credentials(
            Credentials::resolve(Some(&cli.secrets)).context("Failed to load credentials")?,
        ),
    };
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
