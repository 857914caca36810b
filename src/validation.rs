//! Input validation for flow shop instances and job orders.
//!
//! Checks structural integrity before any schedule is built. Detects:
//! - Empty instances (no jobs or no machines)
//! - Ragged processing-time tables
//! - Times large enough to collide with the infinite sentinel
//! - Job orders that are not permutations of `{1..n}`
//!
//! Engines assume validated input; they only `debug_assert!` the same
//! invariants afterwards.

use crate::models::{Job, Time, INFINITE_TIME};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The instance has no jobs or no machines.
    EmptyDimensions,
    /// A job row does not have one entry per machine.
    ShapeMismatch,
    /// A processing time (or the grand total) reaches the infinite sentinel.
    TimeOverflow,
    /// A job order is not a permutation of `{1..n}`.
    NotAPermutation,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a processing-time table given as one row per job.
///
/// Checks:
/// 1. At least one job and one machine
/// 2. Every row has exactly `machines` entries
/// 3. The sum of all times stays below [`INFINITE_TIME`], so no measured
///    completion time can ever equal the sentinel
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_times(times: &[Vec<Time>], machines: usize) -> ValidationResult {
    let mut errors = Vec::new();

    if times.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyDimensions,
            "Instance has no jobs",
        ));
    }
    if machines == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyDimensions,
            "Instance has no machines",
        ));
    }

    let mut total: Time = 0;
    for (j, row) in times.iter().enumerate() {
        if row.len() != machines {
            errors.push(ValidationError::new(
                ValidationErrorKind::ShapeMismatch,
                format!(
                    "Job {} has {} processing times, expected {}",
                    j + 1,
                    row.len(),
                    machines
                ),
            ));
        }
        total = row.iter().fold(total, |acc, &p| acc.saturating_add(p));
    }

    if total >= INFINITE_TIME {
        errors.push(ValidationError::new(
            ValidationErrorKind::TimeOverflow,
            format!("Total processing time {total} reaches the infinite sentinel"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a 1-based job order: slot 0 is ignored, slots `1..=n` must
/// hold every job of `{1..n}` exactly once.
pub fn validate_permutation(order: &[Job], n: usize) -> ValidationResult {
    if order.len() != n + 1 {
        return Err(vec![ValidationError::new(
            ValidationErrorKind::NotAPermutation,
            format!("Order has {} slots, expected {}", order.len().saturating_sub(1), n),
        )]);
    }

    let mut seen = vec![false; n + 1];
    let mut errors = Vec::new();
    for &j in &order[1..] {
        if j == 0 || j > n {
            errors.push(ValidationError::new(
                ValidationErrorKind::NotAPermutation,
                format!("Job {j} is out of range 1..={n}"),
            ));
        } else if std::mem::replace(&mut seen[j], true) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NotAPermutation,
                format!("Job {j} appears more than once"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether `order` (1-based, slot 0 ignored) is a permutation of `{1..n}`.
pub fn is_permutation(order: &[Job], n: usize) -> bool {
    validate_permutation(order, n).is_ok()
}
