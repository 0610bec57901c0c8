use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

/// Writer side of the interval-change channel.
///
/// `send` never blocks: when `capacity` values are already unread the
/// oldest one is overwritten. Receivers only care about the newest value,
/// so losing history is harmless.
#[derive(Debug, Clone)]
pub struct IntervalSignal {
    tx: broadcast::Sender<Duration>,
}

/// Reader side, owned by the collection loop.
#[derive(Debug)]
pub struct IntervalReceiver {
    rx: broadcast::Receiver<Duration>,
}

impl IntervalSignal {
    pub fn new(capacity: usize) -> (Self, IntervalReceiver) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, IntervalReceiver { rx })
    }

    pub fn send(&self, interval: Duration) {
        // Err only means nobody is listening right now.
        let _ = self.tx.send(interval);
    }
}

impl IntervalReceiver {
    /// Waits for the next signal and returns the newest pending interval.
    /// `None` once every sender is gone.
    pub async fn changed(&mut self) -> Option<Duration> {
        let first = loop {
            match self.rx.recv().await {
                Ok(interval) => break interval,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "interval signal lagged, skipping to newest");
                }
                Err(RecvError::Closed) => return None,
            }
        };
        Some(self.latest().unwrap_or(first))
    }

    /// Drains whatever is pending without waiting; newest value wins.
    pub fn latest(&mut self) -> Option<Duration> {
        let mut newest = None;
        loop {
            match self.rx.try_recv() {
                Ok(interval) => newest = Some(interval),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return newest,
            }
        }
    }
}
