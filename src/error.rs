//! Error taxonomy for a single pipeline run.
//!
//! Only some of these ever leave the component that produced them. Trend
//! outages, unusable model output and judge outages are absorbed where they
//! happen (fallback list, "no candidate", fail-open) and exist here so that
//! the logs can name them consistently. Everything else aborts the run and is
//! reported by the CLI or scheduler layer.

use thiserror::Error;

/// Errors that can occur during one run of the posting pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The trends feed could not be reached or returned an unexpected shape.
    #[error("Trend source unavailable: {0}")]
    SourceUnavailable(String),

    /// The model returned output that could not be normalized.
    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    /// The similarity judge could not be consulted.
    #[error("Similarity judge unavailable: {0}")]
    JudgeUnavailable(String),

    /// No non-duplicate topic was found within the attempt budget.
    #[error("No new topic found after {attempts} attempts")]
    SelectionExhausted {
        /// Number of attempts spent
        attempts: usize,
    },

    /// The article itself could not be generated.
    #[error("Content generation failed: {0}")]
    ContentFailure(String),

    /// The blog API rejected or never received the post.
    #[error("Publish failed: {0}")]
    PublishFailure(String),

    /// The history file could not be read or written.
    #[error("History store error: {0}")]
    History(#[from] HistoryError),

    /// Required configuration is missing for the requested mode.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether this error ends the current run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::SourceUnavailable(_)
                | PipelineError::GenerationFailure(_)
                | PipelineError::JudgeUnavailable(_)
        )
    }

    /// Short machine-friendly label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable(_) => "source_unavailable",
            PipelineError::GenerationFailure(_) => "generation_failure",
            PipelineError::JudgeUnavailable(_) => "judge_unavailable",
            PipelineError::SelectionExhausted { .. } => "selection_exhausted",
            PipelineError::ContentFailure(_) => "content_failure",
            PipelineError::PublishFailure(_) => "publish_failure",
            PipelineError::History(_) => "history",
            PipelineError::Config(_) => "config",
        }
    }
}

/// Failures of the on-disk history document.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading, writing or creating the file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid history document
    #[error("Malformed history document {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorbed_errors_are_not_fatal() {
        assert!(!PipelineError::SourceUnavailable("down".into()).is_fatal());
        assert!(!PipelineError::GenerationFailure("bad json".into()).is_fatal());
        assert!(!PipelineError::JudgeUnavailable("timeout".into()).is_fatal());
    }

    #[test]
    fn test_run_ending_errors_are_fatal() {
        assert!(PipelineError::SelectionExhausted { attempts: 5 }.is_fatal());
        assert!(PipelineError::PublishFailure("403".into()).is_fatal());
        assert!(PipelineError::ContentFailure("empty".into()).is_fatal());
    }

    #[test]
    fn test_display_mentions_attempts() {
        let e = PipelineError::SelectionExhausted { attempts: 5 };
        assert_eq!(e.to_string(), "No new topic found after 5 attempts");
        assert_eq!(e.kind(), "selection_exhausted");
    }
}
