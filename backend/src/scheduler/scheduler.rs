//! Fixed-interval ingestion loop.
//!
//! Each timer tick runs one cycle: fetch the feed once, then hand every
//! decoded tick to the repository. Failures stay at the narrowest scope:
//! - a failed fetch empties that cycle only,
//! - a failed insert affects that tick only,
//! - nothing short of the shutdown signal ends the loop.
//!
//! Missed timer ticks are skipped rather than queued, so at most one cycle
//! is in progress and an overrun cycle is followed directly by the next.

use std::future::Future;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{Instrument, error, info, warn};

use crate::config::AppConfig;
use crate::feed::errors::FeedError;
use crate::feed::source::TickSource;
use crate::logger::{TraceId, annotate_span, root_span, warn_if_slow};
use crate::metrics::counters::Counters;
use crate::scheduler::report::CycleReport;
use crate::ticks::errors::PersistError;
use crate::ticks::model::Tick;
use crate::ticks::repository::TickRepository;
use crate::time::now_ms;

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Gap between cycle starts.
    pub tick_interval: Duration,

    /// Bound on a single fetch and on a single insert.
    pub call_timeout: Duration,

    /// Concurrent inserts per cycle. Keep at or below the pool size.
    pub max_in_flight: usize,
}

impl SchedulerConfig {
    pub fn from_app(cfg: &AppConfig) -> Self {
        Self {
            tick_interval: cfg.tick_interval,
            call_timeout: cfg.call_timeout,
            max_in_flight: cfg.max_connections as usize,
        }
    }
}

pub struct Scheduler<S, R> {
    source: S,
    repository: R,
    cfg: SchedulerConfig,

    /// Observability counters (does not affect behavior).
    counters: Counters,
}

impl<S, R> Scheduler<S, R>
where
    S: TickSource,
    R: TickRepository,
{
    pub fn new(source: S, repository: R, cfg: SchedulerConfig, counters: Counters) -> Self {
        Self {
            source,
            repository,
            cfg: SchedulerConfig {
                max_in_flight: cfg.max_in_flight.max(1),
                ..cfg
            },
            counters,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Run cycles until `shutdown` resolves. A cycle already in progress is
    /// allowed to finish.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.cfg.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            every_ms = self.cfg.tick_interval.as_millis() as u64,
            call_timeout_ms = self.cfg.call_timeout.as_millis() as u64,
            max_in_flight = self.cfg.max_in_flight,
            "ingest scheduler started"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let trace_id = TraceId::default();
            let span = root_span("fetch_cycle", &trace_id);

            warn_if_slow("fetch_cycle", self.cfg.tick_interval, self.run_cycle())
                .instrument(span)
                .await;
        }

        let totals = self.counters.snapshot();
        info!(
            cycles = totals.cycles,
            ticks_saved = totals.ticks_saved,
            ticks_failed = totals.ticks_failed,
            "ingest scheduler stopped"
        );
    }

    /// One fetch-then-persist pass.
    pub async fn run_cycle(&self) -> CycleReport {
        self.counters.cycles.fetch_add(1, Ordering::Relaxed);

        let mut report = CycleReport::new(now_ms());

        let fetched = match timeout(self.cfg.call_timeout, self.source.fetch()).await {
            Ok(res) => res,
            Err(_) => Err(FeedError::Timeout(self.cfg.call_timeout)),
        };

        let outcome = match fetched {
            Ok(outcome) => outcome,
            Err(e) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "feed fetch failed; skipping cycle");
                report.fetch_error = Some(e);
                return report;
            }
        };

        annotate_span(outcome.ticks.len());

        self.counters
            .rows_rejected
            .fetch_add(outcome.rejected.len() as u64, Ordering::Relaxed);
        report.rejected = outcome.rejected;

        let call_timeout = self.cfg.call_timeout;
        let repository = &self.repository;

        let results: Vec<(Tick, Result<(), PersistError>)> =
            stream::iter(outcome.ticks.into_values())
                .map(|tick| async move {
                    let res = match timeout(call_timeout, repository.save(&tick)).await {
                        Ok(res) => res,
                        Err(_) => Err(PersistError::Timeout(call_timeout)),
                    };
                    (tick, res)
                })
                .buffer_unordered(self.cfg.max_in_flight)
                .collect()
                .await;

        for (tick, res) in results {
            match res {
                Ok(()) => report.saved.push(tick),
                Err(e) => {
                    error!(
                        pair = %tick.pair,
                        timestamp_ms = tick.timestamp_ms,
                        error = %e,
                        "failed to save tick"
                    );
                    report.failed.push((tick, e));
                }
            }
        }

        self.counters
            .ticks_saved
            .fetch_add(report.saved.len() as u64, Ordering::Relaxed);
        self.counters
            .ticks_failed
            .fetch_add(report.failed.len() as u64, Ordering::Relaxed);

        if report.failed.is_empty() {
            info!(
                started_ms = report.started_ms,
                saved = report.saved.len(),
                rejected = report.rejected.len(),
                "ticks written"
            );
        } else {
            warn!(
                started_ms = report.started_ms,
                saved = report.saved.len(),
                failed = report.failed.len(),
                rejected = report.rejected.len(),
                "ticks written with failures"
            );
        }

        report
    }
}
