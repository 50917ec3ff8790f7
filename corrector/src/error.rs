//! Corrector Error Types
//!
//! This module defines the [`CorrectorError`] enum, which encapsulates every failure that can
//! occur while producing an answer key, grading a submission or persisting attempt records.
//!
//! Only two categories are meant to reach students as distinct messages: a failed answer key
//! ([`CorrectorError::TemplateEvaluation`]) and a structurally broken exercise
//! ([`CorrectorError::StructuralMismatch`]). Everything else is either an input validation
//! problem or an operational failure of the attempt store. Use [`CorrectorError::category`]
//! to route an error to the right notification.
//!
//! # Example
//!
//! ```rust
//! use corrector::error::{CorrectorError, ErrorCategory};
//!
//! let err = CorrectorError::TemplateEvaluation("cell C14 produced no value".to_string());
//! assert_eq!(err.category(), ErrorCategory::TemplateEvaluation);
//! ```

use serde::Serialize;

/// Represents all error types that can occur in the corrector.
#[derive(Debug, thiserror::Error)]
pub enum CorrectorError {
    /// The answer key could not be produced for this student. Fatal for the submission.
    #[error("Template evaluation failed: {0}")]
    TemplateEvaluation(String),

    /// Submitted sub-task count disagrees with the template for one exercise.
    #[error("Exercise {exercise} has {submitted} submitted values, template declares {expected}")]
    StructuralMismatch {
        exercise: usize,
        submitted: usize,
        expected: usize,
    },

    /// The template itself violates its structural invariants.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// The submission could not be interpreted (missing rows, invalid matriculation number).
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Student identifier cannot be used as a storage key.
    #[error("Invalid student id: {0:?}")]
    InvalidStudentId(String),

    /// A score outside `0..=100` was handed to the attempt state machine.
    #[error("Invalid percentage: {0}")]
    InvalidPercentage(u32),

    /// The attempt store could not complete an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse grouping used by the notification layer to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    TemplateEvaluation,
    Structural,
    Other,
}

impl CorrectorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CorrectorError::TemplateEvaluation(_) => ErrorCategory::TemplateEvaluation,
            CorrectorError::StructuralMismatch { .. } => ErrorCategory::Structural,
            _ => ErrorCategory::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_route_only_two_user_visible_kinds() {
        assert_eq!(
            CorrectorError::TemplateEvaluation("x".into()).category(),
            ErrorCategory::TemplateEvaluation
        );
        assert_eq!(
            CorrectorError::StructuralMismatch {
                exercise: 1,
                submitted: 2,
                expected: 3
            }
            .category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            CorrectorError::Storage("disk full".into()).category(),
            ErrorCategory::Other
        );
        assert_eq!(
            CorrectorError::InvalidPercentage(120).category(),
            ErrorCategory::Other
        );
    }

    #[test]
    fn display_mentions_counts() {
        let err = CorrectorError::StructuralMismatch {
            exercise: 2,
            submitted: 2,
            expected: 3,
        };
        assert_eq!(
            err.to_string(),
            "Exercise 2 has 2 submitted values, template declares 3"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CorrectorError = io.into();
        assert!(matches!(err, CorrectorError::Io(_)));
    }
}
