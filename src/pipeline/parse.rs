//! MCQ parsing: turn free-text model output into [`QuestionRecord`]s.
//!
//! The model is asked for numbered questions in a fixed layout (see
//! [`crate::prompts::OUTPUT_FORMAT`]) but nothing guarantees it complies.
//! Parsing is therefore a small, forgiving grammar in three steps:
//!
//! ```text
//! raw ──split──▶ blocks ──tag──▶ [LineTag] ──fold──▶ QuestionRecord | RejectedBlock
//! ```
//!
//! 1. **Split** on numbered-list markers at the start of a line (`1.`,
//!    `**2.**`, `### 3.`, `Question 4.`). Blocks under [`MIN_BLOCK_CHARS`]
//!    are noise. Unparseable text before the first marker is a preamble.
//! 2. **Tag** every line independently: option, answer marker, explanation
//!    marker, blank, or plain text.
//! 3. **Fold** the tags through a four-state machine
//!    (`Scenario → Options → Answer → Explanation`). Plain text continues
//!    whatever field is open; a blank line closes an open answer or
//!    explanation so trailing chatter is not absorbed.
//!
//! A block becomes a record only when it has at least one option and a
//! non-empty answer. Everything else is reported as a [`RejectedBlock`].

use crate::error::{RejectReason, RejectedBlock};
use crate::output::{ParseReport, QuestionRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Blocks shorter than this (after trimming) are dropped as noise.
pub const MIN_BLOCK_CHARS: usize = 20;

const EXCERPT_CHARS: usize = 60;

static RE_BLOCK_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?\*{0,2}(?:Question[ \t]+|Q)?\d+\.\*{0,2}").unwrap()
});

static RE_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-D][).]").unwrap());

static RE_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*{0,2}Correct Answer:\*{0,2}(.*)$").unwrap());

static RE_EXPLANATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*{0,2}Explanation:\*{0,2}(.*)$").unwrap());

/// Parse raw model output into question records, discarding diagnostics.
pub fn parse_mcqs(raw: &str) -> Vec<QuestionRecord> {
    parse_report(raw).questions
}

/// Parse raw model output, keeping track of every dropped block.
pub fn parse_report(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let blocks = split_blocks(raw);
    let has_markers = blocks.len() > 1;

    for (index, block) in blocks.into_iter().enumerate() {
        let block = block.trim();
        if block.chars().count() < MIN_BLOCK_CHARS {
            if !block.is_empty() {
                debug!("Block {}: {} chars, dropped as noise", index, block.len());
                report.noise_blocks += 1;
            }
            continue;
        }

        match parse_block(index, block) {
            Ok(record) => report.questions.push(record),
            Err(_) if index == 0 && has_markers => {
                debug!("Block 0: {} chars of preamble skipped", block.len());
                report.preamble = Some(block.to_string());
            }
            Err(rejected) => {
                debug!("{}", rejected);
                report.rejected.push(rejected);
            }
        }
    }

    if !report.rejected.is_empty() {
        warn!(
            "{} block(s) could not be parsed ({} question(s) parsed)",
            report.rejected.len(),
            report.questions.len()
        );
    }
    report
}

/// Split raw output into candidate blocks on numbered-list markers.
///
/// Text before the first marker is returned as the first block.
pub fn split_blocks(raw: &str) -> Vec<&str> {
    RE_BLOCK_MARKER.split(raw).collect()
}

// ── Tagging ──────────────────────────────────────────────────────────────

/// Classification of one trimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineTag<'a> {
    /// `A) …` / `B. …` — the whole line.
    Option(&'a str),
    /// Remainder after `Correct Answer:`.
    Answer(&'a str),
    /// Remainder after `Explanation:`.
    Explanation(&'a str),
    Blank,
    Text(&'a str),
}

fn tag_line(line: &str) -> LineTag<'_> {
    let l = line.trim();
    if l.is_empty() {
        return LineTag::Blank;
    }
    if RE_OPTION.is_match(l) {
        return LineTag::Option(l);
    }
    if let Some(caps) = RE_ANSWER.captures(l) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        return LineTag::Answer(rest.trim_matches(|c: char| c == '*' || c.is_whitespace()));
    }
    if let Some(caps) = RE_EXPLANATION.captures(l) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        return LineTag::Explanation(
            rest.trim_matches(|c: char| c == '*' || c.is_whitespace()),
        );
    }
    LineTag::Text(l)
}

// ── Folding ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scenario,
    Options,
    Answer,
    Explanation,
}

#[derive(Debug)]
struct BlockBuilder {
    state: State,
    scenario: Vec<String>,
    options: Vec<String>,
    answer: String,
    explanation: String,
    /// Set by a blank line while an answer or explanation is open.
    field_closed: bool,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            state: State::Scenario,
            scenario: Vec::new(),
            options: Vec::new(),
            answer: String::new(),
            explanation: String::new(),
            field_closed: false,
        }
    }

    fn feed(&mut self, tag: LineTag<'_>) {
        match tag {
            LineTag::Option(line) => {
                self.state = State::Options;
                self.options.push(line.to_string());
                self.field_closed = false;
            }
            LineTag::Answer(rest) => {
                self.state = State::Answer;
                self.answer = rest.to_string();
                self.field_closed = false;
            }
            LineTag::Explanation(rest) => {
                self.state = State::Explanation;
                self.explanation = rest.to_string();
                self.field_closed = false;
            }
            LineTag::Blank => {
                if matches!(self.state, State::Answer | State::Explanation) {
                    self.field_closed = true;
                }
            }
            LineTag::Text(line) => match self.state {
                State::Scenario => self.scenario.push(line.to_string()),
                State::Options => {
                    if let Some(last) = self.options.last_mut() {
                        push_joined(last, line);
                    }
                }
                State::Answer if !self.field_closed => push_joined(&mut self.answer, line),
                State::Explanation if !self.field_closed => {
                    push_joined(&mut self.explanation, line)
                }
                State::Answer | State::Explanation => {
                    debug!("Dropping trailing line: {:?}", line);
                }
            },
        }
    }

    fn finish(self, index: usize, block: &str) -> Result<QuestionRecord, RejectedBlock> {
        let reason = match (self.options.is_empty(), self.answer.is_empty()) {
            (false, false) => {
                return Ok(QuestionRecord {
                    scenario: self.scenario.join(" "),
                    options: self.options,
                    answer: self.answer,
                    explanation: self.explanation,
                })
            }
            (true, false) => RejectReason::MissingOptions,
            (false, true) => RejectReason::MissingAnswer,
            (true, true) => RejectReason::MissingBoth,
        };
        Err(RejectedBlock {
            index,
            reason,
            excerpt: block.chars().take(EXCERPT_CHARS).collect(),
        })
    }
}

fn push_joined(field: &mut String, line: &str) {
    if !field.is_empty() {
        field.push(' ');
    }
    field.push_str(line);
}

fn parse_block(index: usize, block: &str) -> Result<QuestionRecord, RejectedBlock> {
    let mut builder = BlockBuilder::new();
    for line in block.lines() {
        builder.feed(tag_line(line));
    }
    builder.finish(index, block)
}
