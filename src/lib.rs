//! Runtime core of a host-level process metrics agent.
//!
//! - [`realtime`]: merges per-endpoint real-time requests into one
//!   process-wide sampling cadence and signals changes without blocking.
//! - [`metrics`]: weighted histogram aggregation with exact, ordered
//!   summary output per flush window.
//! - [`agent`]: the collection loop and the status reporting path that
//!   tie the two together.

pub mod agent;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mock_data;
pub mod realtime;

pub use config::AgentConfig;
pub use error::{AggregateError, ConfigError};
