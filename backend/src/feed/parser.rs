use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::feed::errors::{FeedError, RejectedRow};
use crate::ticks::model::Tick;

/// Result of decoding one feed payload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Latest tick per pair.
    pub ticks: HashMap<String, Tick>,
    pub rejected: Vec<RejectedRow>,
}

impl FetchOutcome {
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

/// Decode a headerless CSV payload into ticks keyed by pair.
///
/// The whole body is tokenized first; a tokenizer failure fails the call.
/// The feed never quotes its fields, so `"` is an ordinary byte and a stray
/// one can only spoil the row it sits in. Rows whose fields do not parse are
/// dropped and returned in `rejected`. When a pair appears twice, the later
/// row wins.
pub fn parse_ticks(body: &[u8]) -> Result<FetchOutcome, FeedError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(body);

    let records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, csv::Error>>()?;

    let mut out = FetchOutcome::default();

    for record in records {
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match Tick::from_record(&record) {
            Ok(tick) => {
                if let Some(prev) = out.ticks.insert(tick.pair.clone(), tick) {
                    debug!(pair = %prev.pair, line, "duplicate pair in payload, keeping later row");
                }
            }
            Err(error) => {
                warn!(line, error = %error, "discarding feed row");
                out.rejected.push(RejectedRow { line, error });
            }
        }
    }

    Ok(out)
}
