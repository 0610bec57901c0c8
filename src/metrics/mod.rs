pub mod accumulator;
pub mod collector;
pub mod histogram;
pub mod percentiles;

pub use accumulator::SampleAccumulator;
pub use collector::{MetricsCollector, Series};
pub use histogram::{AggregateKind, HistogramAggregator, HistogramConfig};

use serde::{Deserialize, Serialize};

/// A single observation produced by the OS-sampling layer.
/// This is the "write" side — samplers create these and push them in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: f64,
    /// Fraction of true events actually observed, in (0, 1].
    /// Zero or negative means "unset" and is treated as unsampled.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Seconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,
}

fn default_sample_rate() -> f64 {
    1.0
}

impl MetricSample {
    /// Unsampled observation.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            sample_rate: 1.0,
            timestamp: 0,
        }
    }

    pub fn with_rate(value: f64, sample_rate: f64) -> Self {
        Self {
            value,
            sample_rate,
            timestamp: 0,
        }
    }

    /// Weight this observation carries in sums, counts and ranks.
    pub fn weight(&self) -> f64 {
        if self.sample_rate > 0.0 {
            1.0 / self.sample_rate
        } else {
            1.0
        }
    }
}

/// One summary point emitted by a histogram flush.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// e.g. ".max", ".95percentile"
    pub name_suffix: String,
    pub value: f64,
    pub timestamp: i64,
}
