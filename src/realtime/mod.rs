//! Process-wide real-time mode: the shared state, the interval signal
//! and the scheduler that writes both.

pub mod scheduler;
pub mod signal;
pub mod status;

pub use scheduler::AdaptiveScheduler;
pub use signal::{IntervalReceiver, IntervalSignal};
pub use status::CollectorStatus;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

/// Upper bound on any real-time interval. Larger requests are clamped.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Snapshot of the real-time decision. Always read and written as a
/// whole so readers never see `enabled` from one update paired with
/// `interval` from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeState {
    pub enabled: bool,
    pub interval: Duration,
}

impl RealtimeState {
    pub fn disabled(interval: Duration) -> Self {
        Self {
            enabled: false,
            interval,
        }
    }
}

/// Cloneable handle to the one `RealtimeState` of the process.
/// Written by the scheduler, read by the collection loop.
#[derive(Debug, Clone)]
pub struct SharedRealtime {
    inner: Arc<RwLock<RealtimeState>>,
}

impl SharedRealtime {
    pub fn new(default_interval: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RealtimeState::disabled(default_interval))),
        }
    }

    pub fn snapshot(&self) -> RealtimeState {
        *self.inner.read()
    }

    pub(crate) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, RealtimeState> {
        self.inner.write()
    }
}
