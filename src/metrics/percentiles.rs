use super::accumulator::WeightedObservation;

/// Nearest-rank percentile over sample-rate-expanded weights.
///
/// `sorted` must be ascending by value and `total_weight` must be the sum
/// of its weights. Returns `None` only for an empty slice.
pub fn weighted_percentile(
    sorted: &[WeightedObservation],
    total_weight: f64,
    percentile: u32,
) -> Option<f64> {
    let first = sorted.first()?;

    let rank = total_weight * f64::from(percentile) / 100.0;
    if rank <= 0.0 {
        return Some(first.value);
    }

    let mut cumulative = 0.0;
    for obs in sorted {
        cumulative += obs.weight;
        if cumulative >= rank {
            return Some(obs.value);
        }
    }

    // Float drift on the final partial sum (or a percentile above 100)
    sorted.last().map(|obs| obs.value)
}

/// Output name suffix for a percentile point, e.g. ".95percentile".
pub fn percentile_suffix(percentile: u32) -> String {
    format!(".{percentile}percentile")
}
