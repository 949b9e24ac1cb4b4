//! Rendering parsed questions for the terminal and for download files.
//!
//! The Markdown and plain-text exports carry the same bytes; only the file
//! extension and MIME type differ.

use crate::error::McqError;
use crate::output::QuestionRecord;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default file stem for exports (`mcqs.md`, `mcqs.txt`).
pub const DEFAULT_STEM: &str = "mcqs";

/// Download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Markdown, ExportFormat::Text];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Text => "text/plain",
        }
    }

    /// Render `records` in this format.
    pub fn render(self, records: &[QuestionRecord]) -> String {
        // Both formats share the Markdown body.
        render_markdown(records)
    }
}

/// Render records as the export document.
///
/// Per record: `### Q{i}: {scenario}`, one line per option, the answer and
/// explanation lines, then a blank line. Numbering starts at 1.
pub fn render_markdown(records: &[QuestionRecord]) -> String {
    let mut out = String::new();
    for (i, q) in records.iter().enumerate() {
        let _ = writeln!(out, "### Q{}: {}", i + 1, q.scenario);
        for opt in &q.options {
            let _ = writeln!(out, "{}", opt);
        }
        let _ = writeln!(out, "**Correct Answer:** {}", q.answer);
        let _ = writeln!(out, "**Explanation:** {}", q.explanation);
        out.push('\n');
    }
    out
}

/// Render records for display on a terminal, one section per question.
pub fn render_terminal(records: &[QuestionRecord]) -> String {
    let mut out = String::new();
    for (i, q) in records.iter().enumerate() {
        let _ = writeln!(out, "── Question {} ──", i + 1);
        let _ = writeln!(out, "Scenario: {}", q.scenario);
        for opt in &q.options {
            let _ = writeln!(out, "  {}", opt);
        }
        let _ = writeln!(out, "Correct Answer: {}", q.answer);
        let _ = writeln!(out, "Explanation: {}", q.explanation);
        out.push('\n');
    }
    out
}

/// Write `{stem}.md` and `{stem}.txt` into `dir`, creating it if needed.
///
/// Each file is written to a temp file in `dir` and then persisted over the
/// target, so a crash never leaves a half-written export behind.
pub fn write_exports(
    dir: &Path,
    stem: &str,
    records: &[QuestionRecord],
) -> Result<Vec<PathBuf>, McqError> {
    std::fs::create_dir_all(dir).map_err(|e| McqError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::with_capacity(ExportFormat::ALL.len());
    for format in ExportFormat::ALL {
        let path = dir.join(format!("{}.{}", stem, format.extension()));
        write_atomic(&path, format.render(records).as_bytes())?;
        debug!("Wrote {} ({})", path.display(), format.mime_type());
        written.push(path);
    }

    info!("Exported {} questions to {}", records.len(), dir.display());
    Ok(written)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), McqError> {
    let write_err = |source| McqError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> QuestionRecord {
        QuestionRecord {
            scenario: "A tenant is evicted without notice.".into(),
            options: vec![
                "A) Valid".into(),
                "B) Invalid".into(),
                "C) Unclear".into(),
                "D) None".into(),
            ],
            answer: "B".into(),
            explanation: "Due process requires notice.".into(),
        }
    }

    #[test]
    fn markdown_layout() {
        let md = render_markdown(&[tenant()]);
        assert_eq!(
            md,
            "### Q1: A tenant is evicted without notice.\n\
             A) Valid\nB) Invalid\nC) Unclear\nD) None\n\
             **Correct Answer:** B\n\
             **Explanation:** Due process requires notice.\n\n"
        );
    }

    #[test]
    fn markdown_numbers_from_one() {
        let md = render_markdown(&[tenant(), tenant(), tenant()]);
        assert!(md.contains("### Q1: "));
        assert!(md.contains("### Q3: "));
        assert!(!md.contains("### Q0: "));
        assert!(!md.contains("### Q4: "));
    }

    #[test]
    fn empty_records_render_empty() {
        assert_eq!(render_markdown(&[]), "");
        assert_eq!(render_terminal(&[]), "");
    }

    #[test]
    fn terminal_keeps_field_order() {
        let out = render_terminal(&[tenant()]);
        let pos = |needle: &str| out.find(needle).unwrap();
        assert!(pos("Question 1") < pos("Scenario:"));
        assert!(pos("Scenario:") < pos("A) Valid"));
        assert!(pos("D) None") < pos("Correct Answer: B"));
        assert!(pos("Correct Answer: B") < pos("Explanation:"));
    }

    #[test]
    fn formats_share_content() {
        let records = [tenant()];
        assert_eq!(
            ExportFormat::Markdown.render(&records),
            ExportFormat::Text.render(&records)
        );
        assert_eq!(ExportFormat::Markdown.mime_type(), "text/markdown");
        assert_eq!(ExportFormat::Text.mime_type(), "text/plain");
    }

    #[test]
    fn write_exports_creates_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested");
        let paths = write_exports(&out_dir, DEFAULT_STEM, &[tenant()]).unwrap();

        assert_eq!(paths, vec![out_dir.join("mcqs.md"), out_dir.join("mcqs.txt")]);
        let md = std::fs::read(&paths[0]).unwrap();
        let txt = std::fs::read(&paths[1]).unwrap();
        assert_eq!(md, txt);
        assert!(String::from_utf8(md).unwrap().starts_with("### Q1: "));
    }

    #[test]
    fn write_exports_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        write_exports(dir.path(), "run", &[tenant(), tenant()]).unwrap();
        write_exports(dir.path(), "run", &[tenant()]).unwrap();
        let md = std::fs::read_to_string(dir.path().join("run.md")).unwrap();
        assert!(!md.contains("### Q2: "));
        // No temp files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
