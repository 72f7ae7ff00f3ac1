//! Error types shared across the pipeline.
//!
//! Search failures never show up here: the search stage absorbs them and
//! continues with an empty result set. Model failures abort the run and
//! surface as [`ResearchError::GenerationFailure`].

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::LlmError;
use crate::pipeline::Stage;

/// Top-level error for a research run.
#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Research query must not be empty")]
    EmptyQuery,

    #[error("Generation failed in {stage} stage: {source}")]
    GenerationFailure {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("{stage} stage requires {field}, which no earlier stage has produced")]
    StageOrder { stage: Stage, field: &'static str },

    #[error("Failed to write report to {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResearchError {
    /// Stage a generation failure or an ordering violation belongs to.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ResearchError::GenerationFailure { stage, .. } => Some(*stage),
            ResearchError::StageOrder { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_generation_failure(&self) -> bool {
        matches!(self, ResearchError::GenerationFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failure_display_names_stage() {
        let err = ResearchError::GenerationFailure {
            stage: Stage::Draft,
            source: LlmError::Completion("connection refused".to_string()),
        };

        let message = err.to_string();
        assert!(message.contains("draft stage"));
        assert!(message.contains("connection refused"));
        assert_eq!(err.stage(), Some(Stage::Draft));
        assert!(err.is_generation_failure());
    }

    #[test]
    fn test_generation_failure_keeps_source() {
        use std::error::Error as _;

        let err = ResearchError::GenerationFailure {
            stage: Stage::Finalize,
            source: LlmError::Completion("timeout".to_string()),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_report_write_display() {
        let err = ResearchError::ReportWrite {
            path: PathBuf::from("/tmp/x_report.txt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/x_report.txt"));
        assert_eq!(err.stage(), None);
        assert!(!err.is_generation_failure());
    }

    #[test]
    fn test_stage_order_reports_its_stage() {
        let err = ResearchError::StageOrder {
            stage: Stage::Finalize,
            field: "draft",
        };

        assert_eq!(err.stage(), Some(Stage::Finalize));
        assert!(!err.is_generation_failure());
    }
}
