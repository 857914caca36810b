//! Error types for flow shop scheduling.
//!
//! Recoverable outcomes of the search (no improvement, local optimum,
//! exhausted budget) are not errors; they end a phase normally and the
//! caller always gets the best schedule found so far.

use thiserror::Error;

use crate::config::ConfigError;
use crate::validation::ValidationError;

/// Main error type for scheduling operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The processing-time table failed validation.
    #[error("invalid instance: {}", summarize(.0))]
    InvalidInstance(Vec<ValidationError>),

    /// Malformed instance or solution text.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A job order is not a permutation of `{1..n}`.
    #[error("job order for machine {machine} is not a permutation")]
    InvalidPermutation { machine: usize },

    /// Perturbation size outside `(0, fbegin)`.
    #[error("cannot remove {size} jobs from a prefix of {scheduled} scheduled jobs")]
    DegeneratePerturbation { size: usize, scheduled: usize },

    /// The idle-time allocator has no hole able to hold an operation.
    #[error("no free interval on machine {machine}")]
    NoFreeInterval { machine: usize },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for scheduling operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_invalid_instance_message_lists_all_errors() {
        let err = ScheduleError::InvalidInstance(vec![
            ValidationError::new(ValidationErrorKind::EmptyDimensions, "no jobs"),
            ValidationError::new(ValidationErrorKind::ShapeMismatch, "row 2 has 3 entries"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid instance: no jobs; row 2 has 3 entries"
        );
    }

    #[test]
    fn test_degenerate_perturbation_message() {
        let err = ScheduleError::DegeneratePerturbation {
            size: 5,
            scheduled: 4,
        };
        assert!(err.to_string().contains("5 jobs"));
    }
}
