//! Text normalisation: whitespace cleanup and the character budget.
//!
//! The prompt is capped by characters rather than tokens. The cut is hard
//! and not sentence-aware; the model sees a possibly truncated final word.

/// Collapse every run of whitespace (including newlines) into one ASCII
/// space and trim both ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// [`clean_text`] followed by [`truncate_chars`].
///
/// Returns the normalised text and the pre-truncation character count.
pub fn normalize(text: &str, max_chars: usize) -> (String, usize) {
    let cleaned = clean_text(text);
    let full_len = cleaned.chars().count();
    let cut = truncate_chars(&cleaned, max_chars).to_string();
    (cut, full_len)
}
