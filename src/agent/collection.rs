use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Observation, Sampler};
use crate::metrics::{MetricsCollector, Series};
use crate::realtime::{IntervalReceiver, SharedRealtime, MAX_INTERVAL};

// ─── Public types ────────────────────────────────────────────────

/// Periodic sampler driven by the real-time state.
///
/// Standard ticks run at a fixed period. Real-time ticks run at the
/// scheduler's interval and only sample while real-time mode is on.
/// Every flush tick drains the collector into the outbound queue.
pub struct CollectionLoop<S: Sampler> {
    sampler: S,
    collector: Arc<MetricsCollector>,
    realtime: SharedRealtime,
    intervals: IntervalReceiver,
    outbound: mpsc::Sender<Vec<Series>>,
    check_interval: Duration,
    flush_interval: Duration,
}

/// Counters returned when the loop stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub standard_ticks: u64,
    pub realtime_ticks: u64,
    pub interval_changes: u64,
    pub batches_sent: u64,
    pub batches_dropped: u64,
}

// ─── CollectionLoop impl ─────────────────────────────────────────

impl<S: Sampler> CollectionLoop<S> {
    pub fn new(
        sampler: S,
        collector: Arc<MetricsCollector>,
        realtime: SharedRealtime,
        intervals: IntervalReceiver,
        outbound: mpsc::Sender<Vec<Series>>,
    ) -> Self {
        Self {
            sampler,
            collector,
            realtime,
            intervals,
            outbound,
            check_interval: Duration::from_secs(10),
            flush_interval: Duration::from_secs(10),
        }
    }

    pub fn with_check_interval(mut self, period: Duration) -> Self {
        self.check_interval = period;
        self
    }

    pub fn with_flush_interval(mut self, period: Duration) -> Self {
        self.flush_interval = period;
        self
    }

    /// Runs until `cancel` fires, then flushes whatever is buffered.
    pub async fn run(mut self, cancel: CancellationToken) -> LoopStats {
        let mut stats = LoopStats::default();

        let start = Instant::now();
        let mut check = ticker(start, self.check_interval);
        let flush_period = bounded(self.flush_interval);
        let mut flush = ticker(start + flush_period, flush_period);
        let mut rt_period = bounded(self.realtime.snapshot().interval);
        let mut rt = ticker(start, rt_period);

        info!(
            check_secs = self.check_interval.as_secs(),
            flush_secs = self.flush_interval.as_secs(),
            rt_secs = rt_period.as_secs(),
            "collection loop started"
        );

        loop {
            tokio::select! {
                // Fixed order: a sample taken at the same instant as a
                // flush lands in that flush.
                biased;

                _ = cancel.cancelled() => break,

                _ = check.tick() => {
                    stats.standard_ticks += 1;
                    let batch = self.sampler.sample();
                    self.record(batch);
                }

                _ = rt.tick() => {
                    if self.realtime.snapshot().enabled {
                        stats.realtime_ticks += 1;
                        let batch = self.sampler.sample_realtime();
                        self.record(batch);
                    }
                }

                Some(next) = self.intervals.changed() => {
                    // Repeated identical values are expected; only a real
                    // change rebuilds the ticker.
                    let next = next.min(MAX_INTERVAL);
                    if next != rt_period && !next.is_zero() {
                        match Instant::now().checked_add(next) {
                            Some(first) => {
                                info!(
                                    from_secs = rt_period.as_secs(),
                                    to_secs = next.as_secs(),
                                    "real-time interval changed"
                                );
                                rt_period = next;
                                rt = ticker(first, next);
                                stats.interval_changes += 1;
                            }
                            None => warn!(
                                to_secs = next.as_secs(),
                                "real-time interval out of range, keeping current ticker"
                            ),
                        }
                    }
                }

                _ = flush.tick() => self.ship(&mut stats),
            }
        }

        self.ship(&mut stats);
        info!(?stats, "collection loop stopped");
        stats
    }

    fn record(&self, batch: Vec<Observation>) {
        let now = chrono::Utc::now().timestamp();
        for obs in batch {
            let ts = if obs.sample.timestamp > 0 {
                obs.sample.timestamp
            } else {
                now
            };
            self.collector.record(&obs.name, obs.sample, ts);
        }
    }

    fn ship(&self, stats: &mut LoopStats) {
        let series = self.collector.flush(chrono::Utc::now().timestamp());
        if series.is_empty() {
            return;
        }

        let points = series.len();
        match self.outbound.try_send(series) {
            Ok(()) => {
                stats.batches_sent += 1;
                debug!(points, "batch queued");
            }
            Err(TrySendError::Full(_)) => {
                stats.batches_dropped += 1;
                warn!(points, "outbound queue full, dropping batch");
            }
            Err(TrySendError::Closed(_)) => {
                stats.batches_dropped += 1;
                debug!(points, "outbound queue closed, dropping batch");
            }
        }
    }
}

/// tokio panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

fn bounded(period: Duration) -> Duration {
    period.clamp(MIN_PERIOD, MAX_INTERVAL)
}

fn ticker(start: Instant, period: Duration) -> Interval {
    let mut i = interval_at(start, bounded(period));
    i.set_missed_tick_behavior(MissedTickBehavior::Delay);
    i
}
