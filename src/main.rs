use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use procagent_core::agent::{run_status_reporter, CollectionLoop, LatestStatuses};
use procagent_core::metrics::{MetricsCollector, Series};
use procagent_core::mock_data::{MockEndpoints, MockSampler};
use procagent_core::realtime::{AdaptiveScheduler, IntervalSignal, SharedRealtime};
use procagent_core::AgentConfig;

/// How often the simulated endpoints answer.
const ENDPOINT_REPLY_PERIOD: Duration = Duration::from_secs(2);

/// Process metrics agent core, running against simulated inputs.
#[derive(Parser)]
#[command(name = "procagent-core", about)]
struct Cli {
    /// Path to a JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Logging filter; overrides the config file. RUST_LOG wins over both.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print version information and exit.
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Version) = &cli.command {
        println!("procagent-core {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // ── 1. Config ────────────────────────────────────────────────
    let cfg = match &cli.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AgentConfig::default(),
    };

    // ── 2. Logging ───────────────────────────────────────────────
    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level: {level}"))?;
    fmt().with_env_filter(filter).with_target(true).init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        allow_real_time = cfg.allow_real_time,
        "starting procagent-core"
    );

    // ── 3. Shared state ──────────────────────────────────────────
    let realtime = SharedRealtime::new(cfg.default_interval());
    let (signal, intervals) = IntervalSignal::new(cfg.realtime_signal_capacity);
    let scheduler = AdaptiveScheduler::new(realtime.clone(), signal)
        .with_real_time_allowed(cfg.allow_real_time);
    let collector = Arc::new(MetricsCollector::new(cfg.histogram_config()));
    let (outbound_tx, outbound_rx) = mpsc::channel(cfg.queue_size);
    let cancel = CancellationToken::new();

    // ── 4. Collection loop ───────────────────────────────────────
    let collection = tokio::spawn(
        CollectionLoop::new(
            MockSampler::new(1000),
            Arc::clone(&collector),
            realtime,
            intervals,
            outbound_tx,
        )
        .with_check_interval(cfg.check_interval())
        .with_flush_interval(cfg.flush_interval())
        .run(cancel.child_token()),
    );

    // ── 5. Reporting path ────────────────────────────────────────
    let latest = LatestStatuses::new();
    tokio::spawn(simulate_endpoints(
        MockEndpoints::new(42, latest.clone()),
        cancel.child_token(),
    ));
    let reporter = tokio::spawn(run_status_reporter(
        latest,
        scheduler,
        cfg.default_interval(),
        cancel.child_token(),
    ));

    // ── 6. Transport stand-in ────────────────────────────────────
    let shipper = tokio::spawn(ship(outbound_rx));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    tracing::info!("received SIGINT, shutting down");
    cancel.cancel();

    let stats = collection.await.context("collection loop panicked")?;
    reporter.await.context("status reporter panicked")?;
    // The loop owned the only sender, so the shipper drains and exits.
    shipper.await.context("shipper panicked")?;

    tracing::info!(
        metrics = collector.metric_names().len(),
        batches_sent = stats.batches_sent,
        batches_dropped = stats.batches_dropped,
        "procagent-core stopped"
    );
    Ok(())
}

async fn simulate_endpoints(mut endpoints: MockEndpoints, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(ENDPOINT_REPLY_PERIOD);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => endpoints.reply(),
        }
    }
}

async fn ship(mut rx: mpsc::Receiver<Vec<Series>>) {
    while let Some(batch) = rx.recv().await {
        let Some(payload) = encode_batch(&batch) else {
            continue;
        };
        tracing::info!(
            at = %chrono::Utc::now().to_rfc3339(),
            points = batch.len(),
            %payload,
            "shipping batch"
        );
    }
}

/// JSON payload for one batch, or `None` after logging why it failed.
fn encode_batch(batch: &[Series]) -> Option<String> {
    match serde_json::to_string(batch) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::warn!(error = %err, points = batch.len(), "failed to encode batch");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, value: f64) -> Series {
        Series {
            name: name.into(),
            value,
            timestamp: 60,
        }
    }

    #[test]
    fn test_encode_batch() {
        let payload = encode_batch(&[point("proc.cpu.max", 1.5)]).unwrap();
        assert_eq!(payload, r#"[{"name":"proc.cpu.max","value":1.5,"timestamp":60}]"#);
    }

    #[test]
    fn test_encode_batch_never_returns_blank_payload() {
        // serde_json writes non-finite floats as null rather than failing.
        let payload = encode_batch(&[point("proc.cpu.avg", f64::NAN)]).unwrap();
        assert!(payload.contains(r#""value":null"#));
        assert_eq!(encode_batch(&[]).as_deref(), Some("[]"));
    }
}
