//! Domain error types.

use thiserror::Error;

use crate::ids::UserId;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A department, question or user record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An answer was submitted for a question other than the one due.
    #[error("stale answer: question {expected} is due, got an answer for question {claimed}")]
    StaleAnswer {
        /// The question number the session is waiting on.
        expected: u32,
        /// The question number the caller claimed to answer.
        claimed: u32,
    },

    /// The user has no active session to act on.
    #[error("no active session for user {0}")]
    SessionExpired(UserId),

    /// The department is unknown, inactive or has no questions.
    #[error("invalid department: {0}")]
    InvalidDepartment(String),

    /// A storage call failed or timed out. Safe to retry.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    /// Returns `true` if the failure is transient and the caller may retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_failures_are_retryable() {
        assert!(DomainError::StorageUnavailable("timeout".into()).is_retryable());
        assert!(!DomainError::NotFound("q".into()).is_retryable());
        assert!(
            !DomainError::StaleAnswer {
                expected: 3,
                claimed: 2
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_stale_answer_message_names_both_question_numbers() {
        let err = DomainError::StaleAnswer {
            expected: 6,
            claimed: 5,
        };
        assert_eq!(
            err.to_string(),
            "stale answer: question 6 is due, got an answer for question 5"
        );
    }
}
