//! The running side of the agent: the collection loop that samples at
//! the cadence the scheduler decides, and the reporting path that feeds
//! the scheduler.

pub mod collection;
pub mod reporter;

pub use collection::{CollectionLoop, LoopStats};
pub use reporter::{run_status_reporter, LatestStatuses, StatusSource};

use crate::metrics::MetricSample;

/// One named observation from the OS-sampling layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub name: String,
    pub sample: MetricSample,
}

impl Observation {
    pub fn new(name: impl Into<String>, sample: MetricSample) -> Self {
        Self {
            name: name.into(),
            sample,
        }
    }
}

/// The process/container inspection layer.
pub trait Sampler: Send + 'static {
    /// Metrics collected on every standard tick.
    fn sample(&mut self) -> Vec<Observation>;

    /// Metrics only collected while real-time mode is enabled.
    fn sample_realtime(&mut self) -> Vec<Observation>;
}
