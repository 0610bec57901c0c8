//! Deterministic stand-ins for the OS-sampling layer and the upstream
//! endpoints, used by the demo binary.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::agent::{LatestStatuses, Observation, Sampler};
use crate::metrics::MetricSample;
use crate::realtime::CollectorStatus;

// ─── Name pools ──────────────────────────────────────────────────

static PROCESSES: &[&str] = &["postgres", "nginx", "redis-server", "sshd", "containerd"];

static ENDPOINTS: &[&str] = &[
    "https://process.us1.example.com",
    "https://process.eu1.example.com",
];

// ─── Sampler ─────────────────────────────────────────────────────

/// Produces plausible per-process CPU/RSS observations.
pub struct MockSampler {
    rng: StdRng,
}

impl MockSampler {
    pub fn new(seed: u64) -> Self {
        // Deterministic RNG so re-runs produce the same data.
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn process_metrics(&mut self, realtime: bool) -> Vec<Observation> {
        let mut out = Vec::with_capacity(PROCESSES.len() * 2);
        for proc_name in PROCESSES {
            let cpu = self.rng.gen_range(0.0..100.0_f64);
            let rss_mb = self.rng.gen_range(8.0..2048.0_f64);

            if realtime {
                // Real-time only reports a sampled subset of processes.
                if self.rng.gen_bool(0.5) {
                    out.push(Observation::new(
                        format!("rt.proc.{proc_name}.cpu_pct"),
                        MetricSample::with_rate(cpu, 0.5),
                    ));
                }
            } else {
                out.push(Observation::new(
                    format!("proc.{proc_name}.cpu_pct"),
                    MetricSample::new(cpu),
                ));
                out.push(Observation::new(
                    format!("proc.{proc_name}.rss_mb"),
                    MetricSample::new(rss_mb),
                ));
            }
        }
        out
    }
}

impl Sampler for MockSampler {
    fn sample(&mut self) -> Vec<Observation> {
        self.process_metrics(false)
    }

    fn sample_realtime(&mut self) -> Vec<Observation> {
        self.process_metrics(true)
    }
}

// ─── Endpoints ───────────────────────────────────────────────────

/// Simulates replies from the upstream endpoints: each one
/// occasionally gains or loses real-time subscribers.
pub struct MockEndpoints {
    rng: StdRng,
    latest: LatestStatuses,
}

impl MockEndpoints {
    pub fn new(seed: u64, latest: LatestStatuses) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            latest,
        }
    }

    /// One round of replies.
    pub fn reply(&mut self) {
        for endpoint in ENDPOINTS {
            let active = if self.rng.gen_bool(0.3) {
                self.rng.gen_range(1..=5)
            } else {
                0
            };
            let interval = self.rng.gen_range(1..=4);
            self.latest
                .record(endpoint, CollectorStatus::new(active, interval));
        }
    }
}
