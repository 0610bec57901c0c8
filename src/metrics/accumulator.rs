use super::percentiles::weighted_percentile;
use super::MetricSample;

// ─── Internal types ──────────────────────────────────────────────

/// A value and the number of true events it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedObservation {
    pub value: f64,
    pub weight: f64,
}

/// Weighted value buffer for one metric within one flush window.
#[derive(Debug, Default)]
pub struct SampleAccumulator {
    observations: Vec<WeightedObservation>,
}

/// A drained window, sorted ascending by value, with its weighted totals.
#[derive(Debug)]
pub struct SortedWindow {
    observations: Vec<WeightedObservation>,
    total_weight: f64,
    weighted_sum: f64,
}

// ─── SampleAccumulator impl ──────────────────────────────────────

impl SampleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) append.
    pub fn push(&mut self, sample: &MetricSample) {
        self.observations.push(WeightedObservation {
            value: sample.value,
            weight: sample.weight(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Raw number of observations (not the weighted count).
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Moves the buffered observations out, leaving the accumulator empty,
    /// and sorts them. Returns `None` when nothing was buffered.
    pub fn take_sorted(&mut self) -> Option<SortedWindow> {
        if self.observations.is_empty() {
            return None;
        }

        let mut observations = std::mem::take(&mut self.observations);
        observations.sort_by(|a, b| a.value.total_cmp(&b.value));

        let (total_weight, weighted_sum) = observations
            .iter()
            .fold((0.0, 0.0), |(w, s), o| (w + o.weight, s + o.value * o.weight));

        Some(SortedWindow {
            observations,
            total_weight,
            weighted_sum,
        })
    }
}

// ─── SortedWindow impl ───────────────────────────────────────────
// Every accessor relies on the window being non-empty, which
// `take_sorted` guarantees.

impl SortedWindow {
    pub fn min(&self) -> f64 {
        self.observations[0].value
    }

    pub fn max(&self) -> f64 {
        self.observations[self.observations.len() - 1].value
    }

    /// Σ(value·weight)
    pub fn sum(&self) -> f64 {
        self.weighted_sum
    }

    /// Σ(weight) — the sample-rate-corrected count.
    pub fn count(&self) -> f64 {
        self.total_weight
    }

    pub fn avg(&self) -> f64 {
        self.weighted_sum / self.total_weight
    }

    pub fn percentile(&self, percentile: u32) -> f64 {
        weighted_percentile(&self.observations, self.total_weight, percentile)
            .unwrap_or_else(|| self.min())
    }

    pub fn observations(&self) -> &[WeightedObservation] {
        &self.observations
    }
}
