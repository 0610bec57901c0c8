use std::time::Duration;

use tracing::{debug, info};

use super::signal::IntervalSignal;
use super::status::CollectorStatus;
use super::{RealtimeState, SharedRealtime, MAX_INTERVAL};

/// Merges the real-time needs of every upstream consumer into one
/// process-wide cadence.
///
/// Each `update_status` is a full re-evaluation of the snapshot it is
/// given: no hysteresis, no memory of earlier reports.
#[derive(Debug, Clone)]
pub struct AdaptiveScheduler {
    state: SharedRealtime,
    signal: IntervalSignal,
    allow_real_time: bool,
}

impl AdaptiveScheduler {
    pub fn new(state: SharedRealtime, signal: IntervalSignal) -> Self {
        Self {
            state,
            signal,
            allow_real_time: true,
        }
    }

    /// With `false`, intervals are still tracked but `enabled` stays off.
    pub fn with_real_time_allowed(mut self, allow: bool) -> Self {
        self.allow_real_time = allow;
        self
    }

    pub fn state(&self) -> &SharedRealtime {
        &self.state
    }

    /// Recompute `RealtimeState` from the latest per-endpoint reports and
    /// signal the new interval. Never blocks on the collection loop.
    ///
    /// - enabled: any endpoint has active clients.
    /// - interval: the slowest interval asked for by any endpoint, active
    ///   or not. Non-positive intervals are ignored; with nothing valid to
    ///   take a max over, the interval is left as it was. Anything above
    ///   `MAX_INTERVAL` is clamped to it.
    pub fn update_status(&self, statuses: &[CollectorStatus]) {
        let requested = statuses.iter().any(CollectorStatus::wants_realtime);
        let enabled = requested && self.allow_real_time;

        let max_secs = statuses
            .iter()
            .map(|s| s.interval_secs)
            .filter(|&secs| secs > 0)
            .max();

        // Held across the send so concurrent callers cannot reorder
        // their state writes and signals.
        let mut state = self.state.write();
        let previous = *state;

        let interval = match max_secs {
            Some(secs) => Duration::from_secs(secs.unsigned_abs()).min(MAX_INTERVAL),
            None => previous.interval,
        };
        *state = RealtimeState { enabled, interval };

        self.signal.send(interval);

        if previous.enabled != enabled {
            info!(
                enabled,
                interval_secs = interval.as_secs(),
                "real-time mode changed"
            );
        } else {
            debug!(
                enabled,
                interval_secs = interval.as_secs(),
                statuses = statuses.len(),
                "real-time status updated"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::IntervalReceiver;

    fn scheduler() -> (AdaptiveScheduler, IntervalReceiver) {
        // Big channel so a test never trips over capacity.
        let (signal, rx) = IntervalSignal::new(1000);
        let scheduler = AdaptiveScheduler::new(SharedRealtime::new(Duration::from_secs(2)), signal);
        (scheduler, rx)
    }

    fn statuses(pairs: &[(i64, i64)]) -> Vec<CollectorStatus> {
        pairs
            .iter()
            .map(|&(clients, secs)| CollectorStatus::new(clients, secs))
            .collect()
    }

    #[test]
    fn test_update_rt_status() {
        let (s, _rx) = scheduler();

        // One endpoint asking is enough.
        s.update_status(&statuses(&[(0, 2), (3, 2), (0, 2)]));
        assert!(s.state().snapshot().enabled);

        // Stays on while it keeps asking.
        s.update_status(&statuses(&[(0, 2), (3, 2), (0, 2)]));
        assert!(s.state().snapshot().enabled);

        // And turns back off.
        s.update_status(&statuses(&[(0, 2), (0, 2), (0, 2)]));
        assert!(!s.state().snapshot().enabled);
    }

    #[test]
    fn test_update_rt_interval_takes_max_over_all() {
        let (s, mut rx) = scheduler();

        s.update_status(&statuses(&[(0, 3), (3, 2), (0, 10)]));
        let state = s.state().snapshot();
        assert!(state.enabled);
        assert_eq!(state.interval, Duration::from_secs(10));
        assert_eq!(rx.latest(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_empty_snapshot_disables_and_keeps_interval() {
        let (s, _rx) = scheduler();
        s.update_status(&statuses(&[(1, 5)]));
        s.update_status(&[]);

        let state = s.state().snapshot();
        assert!(!state.enabled);
        assert_eq!(state.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_non_positive_intervals_ignored() {
        let (s, _rx) = scheduler();
        s.update_status(&statuses(&[(1, 0), (0, -4), (0, 3)]));
        assert_eq!(s.state().snapshot().interval, Duration::from_secs(3));

        s.update_status(&statuses(&[(1, 0), (1, -1)]));
        let state = s.state().snapshot();
        assert!(state.enabled);
        assert_eq!(state.interval, Duration::from_secs(3));
    }

    #[test]
    fn test_huge_interval_is_clamped() {
        let (s, mut rx) = scheduler();
        s.update_status(&statuses(&[(1, i64::MAX)]));

        let state = s.state().snapshot();
        assert!(state.enabled);
        assert_eq!(state.interval, MAX_INTERVAL);
        assert_eq!(rx.latest(), Some(MAX_INTERVAL));
    }

    #[test]
    fn test_real_time_not_allowed() {
        let (signal, _rx) = IntervalSignal::new(8);
        let s = AdaptiveScheduler::new(SharedRealtime::new(Duration::from_secs(2)), signal)
            .with_real_time_allowed(false);

        s.update_status(&statuses(&[(5, 4)]));
        let state = s.state().snapshot();
        assert!(!state.enabled);
        assert_eq!(state.interval, Duration::from_secs(4));
    }

    #[test]
    fn test_small_channel_never_blocks() {
        let (signal, mut rx) = IntervalSignal::new(1);
        let s = AdaptiveScheduler::new(SharedRealtime::new(Duration::from_secs(2)), signal);

        for secs in 1..=50 {
            s.update_status(&statuses(&[(1, secs)]));
        }
        assert_eq!(rx.latest(), Some(Duration::from_secs(50)));
    }
}
