use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub cycles: Arc<AtomicU64>,
    pub fetch_failures: Arc<AtomicU64>,

    // per-record outcomes
    pub rows_rejected: Arc<AtomicU64>,
    pub ticks_saved: Arc<AtomicU64>,
    pub ticks_failed: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub rows_rejected: u64,
    pub ticks_saved: u64,
    pub ticks_failed: u64,
}

impl Counters {
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            rows_rejected: self.rows_rejected.load(Ordering::Relaxed),
            ticks_saved: self.ticks_saved.load(Ordering::Relaxed),
            ticks_failed: self.ticks_failed.load(Ordering::Relaxed),
        }
    }
}
