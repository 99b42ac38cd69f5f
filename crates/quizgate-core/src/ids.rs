//! Validated identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest department identifier accepted, in characters.
pub const MAX_DEPARTMENT_ID_LEN: usize = 64;

/// Platform-assigned numeric user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Creates a user id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `raw` is not positive.
    pub fn new(raw: i64) -> Result<Self, DomainError> {
        if raw <= 0 {
            return Err(DomainError::Validation(format!(
                "user id must be positive, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = DomainError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .parse()
            .map_err(|_| DomainError::Validation(format!("user id is not numeric: {s:?}")))?;
        Self::new(raw)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a department (question bank).
///
/// Trimmed, non-empty, at most [`MAX_DEPARTMENT_ID_LEN`] characters and free
/// of control characters. Human-readable names such as `"Computer Science"`
/// are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepartmentId(String);

impl DepartmentId {
    /// Creates a department id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the trimmed value is empty, too
    /// long, or contains control characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "department id must not be empty".to_owned(),
            ));
        }
        if trimmed.chars().count() > MAX_DEPARTMENT_ID_LEN {
            return Err(DomainError::Validation(format!(
                "department id exceeds {MAX_DEPARTMENT_ID_LEN} characters"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::Validation(
                "department id must not contain control characters".to_owned(),
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DepartmentId {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<DepartmentId> for String {
    fn from(id: DepartmentId) -> Self {
        id.0
    }
}

impl FromStr for DepartmentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DepartmentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
