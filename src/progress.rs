//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to be told
//! when each stage starts and finishes. The completion call can take tens of
//! seconds, so front-ends use these events to keep a spinner alive.
//!
//! # Example
//!
//! ```rust
//! use edgequake_mcq::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{}", stage.label());
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The observable stages of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Reading the PDF and normalising its text.
    Extracting,
    /// Waiting on the completion API.
    Generating,
    /// Splitting model output into question records.
    Parsing,
}

impl Stage {
    /// Human-readable status line for the stage.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Extracting => "Extracting text from PDF...",
            Stage::Generating => "Generating MCQs...",
            Stage::Parsing => "Parsing questions...",
        }
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`  — the finished stage
    /// * `detail` — short summary, e.g. `"14 823 chars via pdfium"`
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called once after parsing, with the number of questions produced.
    fn on_generation_complete(&self, question_count: usize) {
        let _ = question_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

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

        fn on_generation_complete(&self, question_count: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("complete {question_count}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Extracting);
        cb.on_stage_complete(Stage::Extracting, "120 chars");
        cb.on_generation_complete(3);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Generating);
        rec.on_stage_complete(Stage::Generating, "");
        rec.on_generation_complete(7);
        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start Generating", "done Generating", "complete 7"]
        );
    }

    #[test]
    fn labels_are_distinct() {
        assert_ne!(Stage::Extracting.label(), Stage::Generating.label());
        assert_ne!(Stage::Generating.label(), Stage::Parsing.label());
    }
}
