use procagent_core::metrics::{HistogramAggregator, MetricSample, MetricsCollector};
use procagent_core::{AgentConfig, AggregateError};

const EPSILON: f64 = 1e-9;

fn values(points: &[procagent_core::metrics::SeriesPoint]) -> Vec<(String, f64)> {
    points
        .iter()
        .map(|p| (p.name_suffix.clone(), p.value))
        .collect()
}

#[test]
fn weighted_window_matches_backend_reference() {
    let mut h = HistogramAggregator::new();
    h.configure(&["max", "min", "median", "avg", "sum", "count"], &[80, 20, 95]);

    for (value, rate) in [(1.0, 1.0), (2.0, 0.5), (3.0, 0.2), (10.0, 0.5)] {
        h.add_sample(&MetricSample::with_rate(value, rate), 100);
    }

    let points = h.flush(120).unwrap();
    let expected = [
        (".max", 10.0),
        (".min", 1.0),
        (".median", 3.0),
        (".avg", 4.0),
        (".sum", 40.0),
        (".count", 10.0),
        (".20percentile", 2.0),
        (".80percentile", 3.0),
        (".95percentile", 10.0),
    ];

    let got = values(&points);
    assert_eq!(got.len(), expected.len());
    for ((name, value), (want_name, want_value)) in got.iter().zip(expected) {
        assert_eq!(name, want_name);
        assert!((value - want_value).abs() < EPSILON, "{name}: {value}");
    }
    assert!(points.iter().all(|p| p.timestamp == 120));
}

#[test]
fn never_sampled_and_double_flush_are_empty_windows() {
    let mut h = HistogramAggregator::new();
    assert_eq!(h.flush(1), Err(AggregateError::EmptyWindow));

    h.add_sample(&MetricSample::new(5.0), 1);
    assert!(h.flush(2).is_ok());
    assert_eq!(h.flush(3), Err(AggregateError::EmptyWindow));
}

#[test]
fn unsampled_count_is_number_of_samples() {
    let mut h = HistogramAggregator::new();
    h.configure(&["count", "sum", "avg"], &[]);
    let inputs: Vec<f64> = (0..37).map(|i| f64::from(i) * 1.25).collect();
    for &v in &inputs {
        h.add_sample(&MetricSample::new(v), 0);
    }

    let points = h.flush(0).unwrap();
    assert_eq!(points[0].value, inputs.len() as f64);
    let mean = inputs.iter().sum::<f64>() / inputs.len() as f64;
    assert!((points[2].value - mean).abs() < EPSILON);
}

#[test]
fn collector_uses_config_file_histogram_settings() {
    let cfg = AgentConfig::from_json(
        r#"{"histogram": {"aggregates": ["avg", "nope", "max"], "percentiles": [99, 50]}}"#,
    )
    .unwrap();
    let collector = MetricsCollector::new(cfg.histogram_config());

    for v in [4.0, 8.0, 6.0] {
        collector.record("proc.nginx.cpu_pct", MetricSample::new(v), 10);
    }

    let names: Vec<String> = collector.flush(20).into_iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![
            "proc.nginx.cpu_pct.avg",
            "proc.nginx.cpu_pct.max",
            "proc.nginx.cpu_pct.50percentile",
            "proc.nginx.cpu_pct.99percentile",
        ]
    );
    assert!(collector.flush(30).is_empty());
}
