use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::realtime::{AdaptiveScheduler, CollectorStatus};

/// Where the reporting path gets the latest per-endpoint statuses from.
/// Implemented by the transport layer; how replies are fetched is its
/// business.
pub trait StatusSource: Send + 'static {
    fn statuses(&mut self) -> Vec<CollectorStatus>;
}

/// Last reply from each upstream endpoint.
///
/// The transport records a status whenever an endpoint answers; the
/// reporter reads the whole set on every cycle. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct LatestStatuses {
    inner: Arc<Mutex<HashMap<String, CollectorStatus>>>,
}

impl LatestStatuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endpoint: &str, status: CollectorStatus) {
        self.inner.lock().insert(endpoint.to_owned(), status);
    }

    /// Stop counting an endpoint, e.g. once it is removed from config.
    pub fn forget(&self, endpoint: &str) {
        self.inner.lock().remove(endpoint);
    }
}

impl StatusSource for LatestStatuses {
    fn statuses(&mut self) -> Vec<CollectorStatus> {
        self.inner.lock().values().copied().collect()
    }
}

/// Feeds the scheduler every `period` until cancelled. This is the single
/// writer path for the real-time state.
pub async fn run_status_reporter<S: StatusSource>(
    mut source: S,
    scheduler: AdaptiveScheduler,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticks = IntervalStream::new(tokio::time::interval(period));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }
                let statuses = source.statuses();
                scheduler.update_status(&statuses);
            }
        }
    }

    debug!("status reporter stopped");
}
