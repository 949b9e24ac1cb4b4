//! Result types produced by the generation pipeline.

use crate::error::RejectedBlock;
use crate::pipeline::extract::ExtractionStrategy;
use serde::{Deserialize, Serialize};

/// One parsed multiple-choice question.
///
/// Only emitted by the parser when `options` and `answer` are both
/// non-empty. Nothing ties `answer` to an entry of `options`, and the
/// number of options is not fixed at four.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Scenario lines joined with single spaces. May be empty.
    pub scenario: String,
    /// Answer choices in order, e.g. `"A) Valid"`.
    pub options: Vec<String>,
    /// Text after `Correct Answer:`, e.g. `"B"`.
    pub answer: String,
    /// Text after `Explanation:`. May be empty.
    pub explanation: String,
}

impl QuestionRecord {
    /// The option letter named by `answer`, if it starts with one of A–D.
    ///
    /// Accepts `"B"`, `"B)"`, `"B. Invalid"`, `"(B)"` and `"**B**"`. The
    /// letter must stand alone, so `"Both A and B"` names no option.
    pub fn answer_label(&self) -> Option<char> {
        let mut chars = self
            .answer
            .trim_start_matches(['(', '[', '*', ' '])
            .trim_end_matches(['*', ' '])
            .chars();
        let label = chars.next()?.to_ascii_uppercase();
        let standalone = matches!(chars.next(), None | Some(')' | '.' | ']'));
        (standalone && ('A'..='D').contains(&label)).then_some(label)
    }

    /// The option whose label matches [`Self::answer_label`], if any.
    pub fn correct_option(&self) -> Option<&str> {
        let label = self.answer_label()?;
        self.options
            .iter()
            .find(|o| o.starts_with(label))
            .map(String::as_str)
    }
}

/// Everything the parser learned from one raw model output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Parsed questions, in the order their blocks appeared.
    pub questions: Vec<QuestionRecord>,
    /// Blocks that looked substantial but could not be parsed.
    pub rejected: Vec<RejectedBlock>,
    /// Blocks dropped for being shorter than the noise threshold.
    pub noise_blocks: usize,
    /// Unparseable text before the first numbered marker, if any.
    pub preamble: Option<String>,
}

impl ParseReport {
    /// True when nothing parsed and the raw output should be shown instead.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Which extractor produced the text.
    pub strategy: ExtractionStrategy,
    /// Characters after whitespace cleanup, before truncation.
    pub extracted_chars: usize,
    /// Characters actually embedded in the prompt.
    pub sent_chars: usize,
    /// True if the text was cut to the character budget.
    pub truncated: bool,
    /// Question count requested from the model.
    pub requested_questions: u32,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Output of a complete generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Parsed questions (may be empty; see [`Self::is_fallback`]).
    pub questions: Vec<QuestionRecord>,
    /// The unparsed model text, kept for the raw-output fallback.
    pub raw_output: String,
    /// Blocks that were dropped during parsing.
    pub rejected: Vec<RejectedBlock>,
    pub noise_blocks: usize,
    pub stats: GenerationStats,
}

impl GenerationOutput {
    /// True when zero questions parsed: callers should display `raw_output`.
    pub fn is_fallback(&self) -> bool {
        self.questions.is_empty()
    }
}
