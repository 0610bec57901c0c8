use super::accumulator::{SampleAccumulator, SortedWindow};
use super::percentiles::percentile_suffix;
use super::{MetricSample, SeriesPoint};
use crate::error::AggregateError;

// ─── Configuration ───────────────────────────────────────────────

const DEFAULT_AGGREGATES: [AggregateKind; 4] = [
    AggregateKind::Max,
    AggregateKind::Median,
    AggregateKind::Avg,
    AggregateKind::Count,
];
const DEFAULT_PERCENTILES: [u32; 1] = [95];

/// Closed set of summary statistics a histogram can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Max,
    Min,
    Median,
    Avg,
    Sum,
    Count,
}

impl AggregateKind {
    /// Case-sensitive lookup; anything outside the vocabulary is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "median" => Some(Self::Median),
            "avg" => Some(Self::Avg),
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Max => ".max",
            Self::Min => ".min",
            Self::Median => ".median",
            Self::Avg => ".avg",
            Self::Sum => ".sum",
            Self::Count => ".count",
        }
    }

    fn compute(self, window: &SortedWindow) -> f64 {
        match self {
            Self::Max => window.max(),
            Self::Min => window.min(),
            Self::Median => window.percentile(50),
            Self::Avg => window.avg(),
            Self::Sum => window.sum(),
            Self::Count => window.count(),
        }
    }
}

/// Which aggregates and percentiles a histogram emits, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramConfig {
    aggregates: Vec<AggregateKind>,
    /// Ascending; duplicates kept.
    percentiles: Vec<u32>,
}

impl HistogramConfig {
    /// Unknown aggregate names are dropped silently so a newer backend
    /// vocabulary never breaks this agent.
    pub fn new<S: AsRef<str>>(aggregates: &[S], percentiles: &[u32]) -> Self {
        let aggregates = aggregates
            .iter()
            .filter_map(|name| AggregateKind::parse(name.as_ref()))
            .collect();

        let mut percentiles = percentiles.to_vec();
        percentiles.sort_unstable();

        Self {
            aggregates,
            percentiles,
        }
    }

    pub fn aggregates(&self) -> &[AggregateKind] {
        &self.aggregates
    }

    pub fn percentiles(&self) -> &[u32] {
        &self.percentiles
    }

    /// Number of points one successful flush emits.
    pub fn points_per_flush(&self) -> usize {
        self.aggregates.len() + self.percentiles.len()
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            aggregates: DEFAULT_AGGREGATES.to_vec(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
        }
    }
}

// ─── HistogramAggregator ─────────────────────────────────────────

/// Turns a stream of weighted samples into an ordered set of summary
/// points, one window at a time.
///
/// Not synchronized: exactly one owner calls `add_sample` and `flush`.
/// `MetricsCollector` provides the per-name locking when shared.
#[derive(Debug, Default)]
pub struct HistogramAggregator {
    samples: SampleAccumulator,
    config: HistogramConfig,
    last_flush_timestamp: Option<i64>,
}

impl HistogramAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistogramConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replaces the configuration. The current window is kept.
    pub fn configure<S: AsRef<str>>(&mut self, aggregates: &[S], percentiles: &[u32]) {
        self.config = HistogramConfig::new(aggregates, percentiles);
    }

    pub fn set_config(&mut self, config: HistogramConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    /// `timestamp` is accepted for symmetry with other metric kinds; a
    /// histogram window ignores per-sample time.
    pub fn add_sample(&mut self, sample: &MetricSample, _timestamp: i64) {
        self.samples.push(sample);
    }

    /// Closes the window and emits one point per configured aggregate
    /// (configured order), then one per percentile (ascending).
    pub fn flush(&mut self, timestamp: i64) -> Result<Vec<SeriesPoint>, AggregateError> {
        let window = self.samples.take_sorted().ok_or(AggregateError::EmptyWindow)?;

        let mut points = Vec::with_capacity(self.config.points_per_flush());

        for &kind in &self.config.aggregates {
            points.push(SeriesPoint {
                name_suffix: kind.suffix().to_owned(),
                value: kind.compute(&window),
                timestamp,
            });
        }

        for &p in &self.config.percentiles {
            points.push(SeriesPoint {
                name_suffix: percentile_suffix(p),
                value: window.percentile(p),
                timestamp,
            });
        }

        self.last_flush_timestamp = Some(timestamp);
        Ok(points)
    }

    /// Timestamp of the last successful flush, if any.
    pub fn last_flush_timestamp(&self) -> Option<i64> {
        self.last_flush_timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_point(point: &SeriesPoint, suffix: &str, value: f64, timestamp: i64) {
        assert_eq!(point.name_suffix, suffix);
        assert!(
            (point.value - value).abs() < EPSILON,
            "{suffix}: expected {value}, got {}",
            point.value
        );
        assert_eq!(point.timestamp, timestamp);
    }

    fn add_values(h: &mut HistogramAggregator, values: &[f64]) {
        for &v in values {
            h.add_sample(&MetricSample::new(v), 55);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(AggregateKind::parse("max"), Some(AggregateKind::Max));
        assert_eq!(AggregateKind::parse("Max"), None);
        assert_eq!(AggregateKind::parse("p95"), None);
    }

    #[test]
    fn test_config_sorts_percentiles_and_keeps_duplicates() {
        let cfg = HistogramConfig::new(&["sum", "bogus", "max"], &[95, 20, 80, 20]);
        assert_eq!(cfg.aggregates(), &[AggregateKind::Sum, AggregateKind::Max]);
        assert_eq!(cfg.percentiles(), &[20, 20, 80, 95]);
        assert_eq!(cfg.points_per_flush(), 6);
    }

    #[test]
    fn test_default_histogram_sampling() {
        let mut h = HistogramAggregator::new();
        assert_eq!(h.flush(50), Err(AggregateError::EmptyWindow));

        add_values(&mut h, &[1.0, 10.0, 4.0, 5.0, 2.0, 2.0]);

        let points = h.flush(60).unwrap();
        assert_eq!(points.len(), 5);
        assert_point(&points[0], ".max", 10.0, 60);
        assert_point(&points[1], ".median", 2.0, 60);
        assert_point(&points[2], ".avg", 4.0, 60);
        assert_point(&points[3], ".count", 6.0, 60);
        assert_point(&points[4], ".95percentile", 10.0, 60);

        assert_eq!(h.flush(61), Err(AggregateError::EmptyWindow));
        assert_eq!(h.last_flush_timestamp(), Some(60));
    }

    #[test]
    fn test_custom_histogram_drops_unknown_aggregates() {
        let mut h = HistogramAggregator::new();
        h.configure(&["min", "sum", "invalid"], &[]);
        assert_eq!(h.flush(50), Err(AggregateError::EmptyWindow));

        add_values(&mut h, &[1.0, 10.0, 4.0, 5.0, 2.0, 2.0]);

        let points = h.flush(60).unwrap();
        assert_eq!(points.len(), 2);
        assert_point(&points[0], ".min", 1.0, 60);
        assert_point(&points[1], ".sum", 24.0, 60);

        assert!(h.flush(61).is_err());
    }

    #[test]
    fn test_histogram_percentiles_on_shuffled_input() {
        let mut h = HistogramAggregator::new();
        h.configure(&["max", "median", "avg", "count", "min"], &[95, 80]);

        let mut values: Vec<f64> = (1..=100).map(f64::from).collect();
        values.shuffle(&mut StdRng::seed_from_u64(42));
        for v in values {
            for _ in 0..20 {
                h.add_sample(&MetricSample::new(v), 50);
            }
        }

        let points = h.flush(60).unwrap();
        assert_eq!(points.len(), 7);
        assert_point(&points[0], ".max", 100.0, 60);
        assert_point(&points[1], ".median", 50.0, 60);
        assert_point(&points[2], ".avg", 50.5, 60);
        assert_point(&points[3], ".count", 2000.0, 60);
        assert_point(&points[4], ".min", 1.0, 60);
        assert_point(&points[5], ".80percentile", 80.0, 60);
        assert_point(&points[6], ".95percentile", 95.0, 60);
    }

    #[test]
    fn test_histogram_sample_rate() {
        let mut h = HistogramAggregator::new();
        h.configure(&["max", "min", "median", "avg", "sum", "count"], &[20, 95, 80]);

        h.add_sample(&MetricSample::new(1.0), 50);
        h.add_sample(&MetricSample::with_rate(2.0, 0.5), 50);
        h.add_sample(&MetricSample::with_rate(3.0, 0.2), 50);
        h.add_sample(&MetricSample::with_rate(10.0, 0.5), 50);

        let points = h.flush(60).unwrap();
        assert_eq!(points.len(), 9);
        assert_point(&points[0], ".max", 10.0, 60);
        assert_point(&points[1], ".min", 1.0, 60);
        assert_point(&points[2], ".median", 3.0, 60);
        assert_point(&points[3], ".avg", 4.0, 60);
        assert_point(&points[4], ".sum", 40.0, 60);
        assert_point(&points[5], ".count", 10.0, 60);
        assert_point(&points[6], ".20percentile", 2.0, 60);
        assert_point(&points[7], ".80percentile", 3.0, 60);
        assert_point(&points[8], ".95percentile", 10.0, 60);

        assert!(h.flush(61).is_err());
    }

    #[test]
    fn test_histogram_reset_between_windows() {
        let mut h = HistogramAggregator::new();
        h.configure(&["max", "min", "median", "avg", "sum", "count"], &[20, 95, 80]);

        h.add_sample(&MetricSample::new(1.0), 50);
        h.add_sample(&MetricSample::with_rate(2.0, 0.5), 50);
        assert!(h.flush(60).is_ok());

        h.add_sample(&MetricSample::new(10.0), 50);
        let points = h.flush(70).unwrap();
        assert_eq!(points.len(), 9);
        assert_point(&points[0], ".max", 10.0, 70);
        assert_point(&points[1], ".min", 10.0, 70);
        assert_point(&points[2], ".median", 10.0, 70);
        assert_point(&points[3], ".avg", 10.0, 70);
        assert_point(&points[4], ".sum", 10.0, 70);
        assert_point(&points[5], ".count", 1.0, 70);
        assert_point(&points[6], ".20percentile", 10.0, 70);
        assert_point(&points[7], ".80percentile", 10.0, 70);
        assert_point(&points[8], ".95percentile", 10.0, 70);

        assert!(h.flush(71).is_err());
    }

    #[test]
    fn test_failed_flush_keeps_state() {
        let mut h = HistogramAggregator::new();
        h.configure(&["sum"], &[50]);
        add_values(&mut h, &[3.0]);
        h.flush(10).unwrap();
        assert!(h.is_empty());

        assert!(h.flush(20).is_err());
        assert_eq!(h.last_flush_timestamp(), Some(10));
        assert_eq!(h.config().aggregates(), &[AggregateKind::Sum]);
    }

    #[test]
    fn test_unsampled_avg_matches_naive_mean() {
        let values = [0.1, 0.7, 3.3, 12.25, 8.0, 1.5, 0.05];
        let mut h = HistogramAggregator::new();
        h.configure(&["avg", "count"], &[]);
        add_values(&mut h, &values);

        let points = h.flush(1).unwrap();
        let naive = values.iter().sum::<f64>() / values.len() as f64;
        assert_point(&points[0], ".avg", naive, 1);
        assert_eq!(points[1].value, values.len() as f64);
    }
}
