use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::metrics::HistogramConfig;

// ─── Agent configuration ─────────────────────────────────────────

/// Runtime knobs for the scheduler, collection loop and histograms.
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// When false, upstream requests for real-time mode are ignored
    #[serde(default = "default_true")]
    pub allow_real_time: bool,

    /// Real-time interval before any endpoint has reported (seconds)
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: u64,

    /// Capacity of the interval-change signal channel
    #[serde(default = "default_signal_capacity")]
    pub realtime_signal_capacity: usize,

    /// Outbound series batches buffered before new ones are dropped
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// Standard (non-real-time) sampling cadence (seconds)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Histogram flush cadence (seconds)
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    #[serde(default)]
    pub histogram: HistogramSettings,
}

/// Aggregates and percentiles emitted for every histogram metric.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistogramSettings {
    #[serde(default = "default_aggregates")]
    pub aggregates: Vec<String>,

    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<i64>,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}
fn default_interval_secs() -> u64 {
    2
}
fn default_signal_capacity() -> usize {
    16
}
fn default_queue_size() -> usize {
    20
}
fn default_check_interval_secs() -> u64 {
    10
}
fn default_flush_interval_secs() -> u64 {
    10
}
fn default_aggregates() -> Vec<String> {
    ["max", "median", "avg", "count"].map(String::from).to_vec()
}
fn default_percentiles() -> Vec<i64> {
    vec![95]
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            aggregates: default_aggregates(),
            percentiles: default_percentiles(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            allow_real_time: default_true(),
            default_interval_secs: default_interval_secs(),
            realtime_signal_capacity: default_signal_capacity(),
            queue_size: default_queue_size(),
            check_interval_secs: default_check_interval_secs(),
            flush_interval_secs: default_flush_interval_secs(),
            histogram: HistogramSettings::default(),
        }
    }
}

// ─── Loading / validation ────────────────────────────────────────

impl AgentConfig {
    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: Default::default(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = [
            ("default_interval_secs", self.default_interval_secs == 0),
            ("realtime_signal_capacity", self.realtime_signal_capacity == 0),
            ("queue_size", self.queue_size == 0),
            ("check_interval_secs", self.check_interval_secs == 0),
            ("flush_interval_secs", self.flush_interval_secs == 0),
        ];
        if let Some((field, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::Invalid(format!("{field} must be > 0")));
        }

        if let Some(p) = self
            .histogram
            .percentiles
            .iter()
            .find(|p| !(0..=100).contains(*p))
        {
            return Err(ConfigError::Invalid(format!(
                "percentile {p} outside 0..=100"
            )));
        }

        Ok(())
    }

    /// Resolved histogram config. Unknown aggregate names drop out here.
    pub fn histogram_config(&self) -> HistogramConfig {
        let percentiles: Vec<u32> = self
            .histogram
            .percentiles
            .iter()
            .filter_map(|&p| u32::try_from(p).ok())
            .collect();
        HistogramConfig::new(self.histogram.aggregates.as_slice(), &percentiles)
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.default_interval_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}
