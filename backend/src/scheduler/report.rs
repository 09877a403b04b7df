use crate::feed::errors::{FeedError, RejectedRow};
use crate::ticks::errors::PersistError;
use crate::ticks::model::Tick;

/// Everything one fetch cycle did, good and bad.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub started_ms: u64,

    /// Set when the feed could not be read at all; nothing else ran.
    pub fetch_error: Option<FeedError>,

    /// Rows dropped while decoding the payload.
    pub rejected: Vec<RejectedRow>,

    pub saved: Vec<Tick>,
    pub failed: Vec<(Tick, PersistError)>,
}

impl CycleReport {
    pub fn new(started_ms: u64) -> Self {
        Self {
            started_ms,
            ..Self::default()
        }
    }

    /// Ticks handed to the repository, successful or not.
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.fetch_error.is_none() && self.rejected.is_empty() && self.failed.is_empty()
    }
}
