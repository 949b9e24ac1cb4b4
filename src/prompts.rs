//! Prompt text for MCQ generation.
//!
//! The instruction block and the output-format contract live here so the
//! parser in [`crate::pipeline::parse`] and the prompt can be read side by
//! side: the markers named in [`OUTPUT_FORMAT`] are exactly the markers the
//! parser looks for.

/// Role and task framing.
pub const TASK_INSTRUCTIONS: &str = "You are a highly trained legal tutor. Your job is to generate \
multiple choice questions from the following legal content. Use only scenario-based MCQs — \
questions based on hypothetical legal facts.";

/// Output contract. Must stay in sync with the parser's markers.
pub const OUTPUT_FORMAT: &str = "Instructions:
- Present a real-world scenario (2–4 lines).
- Ask a legal reasoning question about it.
- Provide 4 answer options, only one correct.
- After the options, write:
Correct Answer: [A/B/C/D]
Explanation: [1–2 sentence legal reasoning + case law]";

/// Topical cues steering the model toward the intended body of law.
pub const SUBJECT_HINT: &str = "Use Indian constitutional law cases, especially Article 21 topics like:
- Right to life, liberty, fair procedure, privacy, shelter
- D.K. Basu, Maneka Gandhi, Olga Tellis, Puttaswamy, etc.";

/// Build the single user prompt sent to the completion API.
///
/// `text` is embedded verbatim; no validation is applied to `n_questions`
/// (range clamping happens in [`crate::config`]).
pub fn build_prompt(text: &str, n_questions: u32) -> String {
    format!(
        "\n{TASK_INSTRUCTIONS}\n\n{OUTPUT_FORMAT}\n\n{SUBJECT_HINT}\n\nText: {text}\n\
         Generate {n_questions} MCQs from the above text.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_count() {
        let p = build_prompt("The petitioner was detained.", 12);
        assert!(p.contains("Text: The petitioner was detained."));
        assert!(p.contains("Generate 12 MCQs from the above text."));
    }

    #[test]
    fn prompt_carries_output_contract() {
        let p = build_prompt("x", 5);
        assert!(p.contains("Correct Answer: [A/B/C/D]"));
        assert!(p.contains("Explanation:"));
        assert!(p.contains("4 answer options"));
    }

    #[test]
    fn prompt_carries_subject_hint() {
        let p = build_prompt("x", 5);
        assert!(p.contains("Article 21"));
        assert!(p.contains("Puttaswamy"));
    }

    #[test]
    fn count_is_not_validated_here() {
        assert!(build_prompt("x", 0).contains("Generate 0 MCQs"));
        assert!(build_prompt("x", 500).contains("Generate 500 MCQs"));
    }
}
