use std::path::PathBuf;

use thiserror::Error;

// ─── Aggregation errors ──────────────────────────────────────────

/// Raised by `HistogramAggregator::flush`.
///
/// Always recoverable: the caller skips emission for that metric this
/// cycle and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Nothing was added since construction or since the last flush.
    #[error("flush window is empty")]
    EmptyWindow,
}

// ─── Configuration errors ────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AggregateError::EmptyWindow.to_string(), "flush window is empty");

        let err = ConfigError::Invalid("queue_size must be > 0".into());
        assert!(err.to_string().contains("queue_size"));
    }
}
