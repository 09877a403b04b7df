use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    /// Driver error, passed through untouched.
    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error("timestamp {0}ms is outside the representable range")]
    TimestampOutOfRange(i64),

    #[error("insert timed out after {0:?}")]
    Timeout(Duration),
}

/// Row-level failure: the row is dropped, the fetch goes on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("could not parse fields: {}", DisplayList(.0))]
    InvalidFields(Vec<FieldError>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?} ({})", self.field, self.value, self.reason)
    }
}

struct DisplayList<'a>(&'a [FieldError]);

impl fmt::Display for DisplayList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
