use serde::{Deserialize, Serialize};

/// What one upstream endpoint reported on its last reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorStatus {
    /// Real-time subscribers currently served by the endpoint.
    #[serde(default)]
    pub active_clients: i64,
    /// Desired real-time interval, seconds.
    #[serde(rename = "interval")]
    pub interval_secs: i64,
}

impl CollectorStatus {
    pub fn new(active_clients: i64, interval_secs: i64) -> Self {
        Self {
            active_clients,
            interval_secs,
        }
    }

    pub fn wants_realtime(&self) -> bool {
        self.active_clients > 0
    }
}
