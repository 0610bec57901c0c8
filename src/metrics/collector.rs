use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use super::histogram::{HistogramAggregator, HistogramConfig};
use super::MetricSample;
use crate::error::AggregateError;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe registry of one histogram per metric name.
/// Samplers call `record()`, the collection loop calls `flush()`.
///
/// A single lock covers every aggregator, so `add_sample` and `flush`
/// on the same name can never interleave.
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

/// One fully-named output point, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Metric name plus aggregate suffix, e.g. "proc.cpu.max"
    pub name: String,
    pub value: f64,
    pub timestamp: i64,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    config: HistogramConfig,
    // Ordered so flush output is deterministic
    histograms: BTreeMap<String, HistogramAggregator>,
}

// ─── MetricsCollector impl ───────────────────────────────────────

impl MetricsCollector {
    pub fn new(config: HistogramConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                histograms: BTreeMap::new(),
            }),
        }
    }

    /// Record a single observation for `name`.
    pub fn record(&self, name: &str, sample: MetricSample, timestamp: i64) {
        let mut inner = self.inner.lock();
        if let Some(h) = inner.histograms.get_mut(name) {
            h.add_sample(&sample, timestamp);
            return;
        }

        let mut h = HistogramAggregator::with_config(inner.config.clone());
        h.add_sample(&sample, timestamp);
        inner.histograms.insert(name.to_owned(), h);
    }

    /// Flush every histogram. Names with an empty window emit nothing
    /// and are dropped; they come back on their next `record`.
    pub fn flush(&self, timestamp: i64) -> Vec<Series> {
        let mut inner = self.inner.lock();
        let mut out = Vec::new();

        inner.histograms.retain(|name, h| match h.flush(timestamp) {
            Ok(points) => {
                out.extend(points.into_iter().map(|p| Series {
                    name: format!("{name}{}", p.name_suffix),
                    value: p.value,
                    timestamp: p.timestamp,
                }));
                true
            }
            Err(AggregateError::EmptyWindow) => {
                trace!(metric = %name, "empty window, dropping metric");
                false
            }
        });

        out
    }

    /// Swap the aggregate/percentile set for current and future metrics.
    /// Buffered samples are kept.
    pub fn reconfigure(&self, config: HistogramConfig) {
        let mut inner = self.inner.lock();
        for h in inner.histograms.values_mut() {
            h.set_config(config.clone());
        }
        inner.config = config;
    }

    /// Metric names seen since their last empty flush.
    pub fn metric_names(&self) -> Vec<String> {
        self.inner.lock().histograms.keys().cloned().collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(HistogramConfig::default())
    }
}
