use chrono::{DateTime, NaiveDateTime};
use csv::StringRecord;

use crate::ticks::errors::{FieldError, RowError};

/// Number of leading columns a feed row must carry.
pub const FEED_FIELDS: usize = 8;

/// One quote snapshot for a currency pair.
///
/// Prices are pip-split: `bid_big` holds the whole-unit part and
/// `bid_points` the fractional pip part, likewise for the offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub pair: String,
    pub timestamp_ms: i64,
    pub bid_big: f64,
    pub bid_points: f64,
    pub offer_big: f64,
    pub offer_points: f64,
    pub high: f64,
    pub low: f64,
}

impl Tick {
    /// Decode one headerless feed record:
    /// `pair, timestamp, bidBig, bidPoints, offerBig, offerPoints, high, low`.
    ///
    /// Every numeric column is parsed independently and all failures are
    /// reported together. Columns past the eighth are ignored.
    pub fn from_record(record: &StringRecord) -> Result<Self, RowError> {
        if record.len() < FEED_FIELDS {
            return Err(RowError::TooFewFields {
                expected: FEED_FIELDS,
                found: record.len(),
            });
        }

        let mut failures = Vec::new();

        let timestamp_ms = match record[1].parse::<i64>() {
            Ok(v) => Some(v),
            Err(e) => {
                failures.push(FieldError::new("timestamp", &record[1], e));
                None
            }
        };

        let mut prices = [0.0_f64; 6];
        for (slot, (idx, name)) in prices.iter_mut().zip(PRICE_COLUMNS) {
            match record[idx].parse::<f64>() {
                Ok(v) => *slot = v,
                Err(e) => failures.push(FieldError::new(name, &record[idx], e)),
            }
        }

        let Some(timestamp_ms) = timestamp_ms.filter(|_| failures.is_empty()) else {
            return Err(RowError::InvalidFields(failures));
        };

        let [bid_big, bid_points, offer_big, offer_points, high, low] = prices;

        Ok(Self {
            pair: record[0].to_string(),
            timestamp_ms,
            bid_big,
            bid_points,
            offer_big,
            offer_points,
            high,
            low,
        })
    }

    /// Format back into the feed's column order.
    pub fn to_record(&self) -> StringRecord {
        StringRecord::from(vec![
            self.pair.clone(),
            self.timestamp_ms.to_string(),
            self.bid_big.to_string(),
            self.bid_points.to_string(),
            self.offer_big.to_string(),
            self.offer_points.to_string(),
            self.high.to_string(),
            self.low.to_string(),
        ])
    }

    /// Whole seconds since epoch. Sub-second precision is truncated.
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp_ms / 1000
    }

    /// Value stored in the `time` column.
    pub fn time(&self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.epoch_seconds(), 0).map(|dt| dt.naive_utc())
    }
}

const PRICE_COLUMNS: [(usize, &str); 6] = [
    (2, "bidBig"),
    (3, "bidPoints"),
    (4, "offerBig"),
    (5, "offerPoints"),
    (6, "high"),
    (7, "low"),
];
