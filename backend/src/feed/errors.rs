use thiserror::Error;

use crate::ticks::errors::RowError;

/// Request-level failure: the whole fetch is unusable.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed csv payload: {0}")]
    Csv(#[from] csv::Error),

    #[error("feed request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// A row that failed to decode, with its 1-based line in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub line: u64,
    pub error: RowError,
}
