use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use forex_ingest::feed::{FeedError, FetchOutcome, TickSource};
use forex_ingest::ticks::{PersistError, Tick, TickRepository};

pub fn tick(pair: &str, ts: i64) -> Tick {
    Tick {
        pair: pair.into(),
        timestamp_ms: ts,
        bid_big: 1.0,
        bid_points: 23456.0,
        offer_big: 1.0,
        offer_points: 23556.0,
        high: 1.3,
        low: 1.1,
    }
}

pub fn outcome(ticks: Vec<Tick>) -> FetchOutcome {
    FetchOutcome {
        ticks: ticks.into_iter().map(|t| (t.pair.clone(), t)).collect(),
        rejected: Vec::new(),
    }
}

/// Replays queued fetch results, then keeps returning `fallback`.
#[derive(Clone, Default)]
pub struct MockSource {
    pub queued: Arc<Mutex<VecDeque<Result<FetchOutcome, FeedError>>>>,
    pub fallback: FetchOutcome,
    pub delay: Option<Duration>,
    pub calls: Arc<Mutex<usize>>,
}

impl MockSource {
    pub fn always(fallback: FetchOutcome) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    /// Test convenience
    pub async fn push(&self, next: Result<FetchOutcome, FeedError>) {
        self.queued.lock().await.push_back(next);
    }
}

#[async_trait]
impl TickSource for MockSource {
    async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        *self.calls.lock().await += 1;

        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        match self.queued.lock().await.pop_front() {
            Some(next) => next,
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Records every save attempt; refuses pairs in `fail_pairs`, stalls on
/// pairs in `slow_pairs`.
#[derive(Clone, Default)]
pub struct MockRepository {
    pub attempts: Arc<Mutex<Vec<String>>>,
    pub saved: Arc<Mutex<Vec<Tick>>>,
    pub fail_pairs: HashSet<String>,
    pub slow_pairs: HashSet<String>,
}

impl MockRepository {
    pub fn failing(pairs: &[&str]) -> Self {
        Self {
            fail_pairs: pairs.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn stalling(pairs: &[&str]) -> Self {
        Self {
            slow_pairs: pairs.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TickRepository for MockRepository {
    async fn save(&self, tick: &Tick) -> Result<(), PersistError> {
        self.attempts.lock().await.push(tick.pair.clone());

        if self.slow_pairs.contains(&tick.pair) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self.fail_pairs.contains(&tick.pair) {
            return Err(PersistError::Storage(sqlx::Error::PoolTimedOut));
        }

        self.saved.lock().await.push(tick.clone());
        Ok(())
    }
}
