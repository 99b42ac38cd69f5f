//! Storage-layer error type.

use quizgate_core::error::DomainError;
use thiserror::Error;

/// Failure inside a store operation, before it is reported to callers.
#[derive(Debug, Error)]
pub(crate) enum StoreError {
    /// The database call failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row violates a domain rule.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The operation hit a domain condition such as a stale answer.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<StoreError> for DomainError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Domain(e) => e,
            other => DomainError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Converts a non-negative integer column to `u32`.
pub(crate) fn column_u32(value: i32, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{column} is negative: {value}")))
}

/// Converts a non-negative bigint column to `u64`.
pub(crate) fn column_u64(value: i64, column: &str) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{column} is negative: {value}")))
}

/// Converts a counter to an `INTEGER` parameter.
pub(crate) fn param_i32(value: u32, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| {
        StoreError::Domain(DomainError::Validation(format!(
            "{column} out of range: {value}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_pass_through_unchanged() {
        let error: DomainError = StoreError::Domain(DomainError::StaleAnswer {
            expected: 3,
            claimed: 2,
        })
        .into();
        assert!(matches!(
            error,
            DomainError::StaleAnswer {
                expected: 3,
                claimed: 2
            }
        ));
    }

    #[test]
    fn test_database_and_corrupt_rows_become_storage_unavailable() {
        let db: DomainError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        let corrupt: DomainError = StoreError::Corrupt("answer is 'e'".into()).into();
        assert!(db.is_retryable());
        assert!(matches!(corrupt, DomainError::StorageUnavailable(m) if m.contains("answer")));
    }

    #[test]
    fn test_column_conversions_reject_negative_values() {
        assert_eq!(column_u32(7, "x").unwrap(), 7);
        assert!(matches!(column_u32(-1, "x"), Err(StoreError::Corrupt(_))));
        assert!(matches!(column_u64(-1, "x"), Err(StoreError::Corrupt(_))));
        assert!(matches!(
            param_i32(u32::MAX, "x"),
            Err(StoreError::Domain(DomainError::Validation(_)))
        ));
    }
}
