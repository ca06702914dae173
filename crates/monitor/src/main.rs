//! podpulse - deployment saturation monitor
//!
//! Samples per-pod CPU and deployment replica counts from a cluster
//! once per tick, derives saturation/queueing/scaling events, and
//! appends them to a durable NDJSON or CSV log with a JSON summary
//! at run termination.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kube::Client;
use monitor_lib::collector::KubeSource;
use monitor_lib::sink::{CsvSink, EventSink, NdjsonSink, SharedSink};
use monitor_lib::{Monitor, MonitorConfig, MonitorMetrics};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;

/// Event log encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Ndjson,
    Csv,
}

/// Deployment saturation monitor
#[derive(Parser)]
#[command(name = "podpulse")]
#[command(author, version, about = "Cluster saturation and scaling event monitor", long_about = None)]
struct Cli {
    /// Namespace to monitor
    #[arg(long, env = "PODPULSE_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Deployment whose status replica count drives scale events
    #[arg(long, env = "PODPULSE_DEPLOYMENT", default_value = "api")]
    deployment_name: String,

    /// Label selector for the pods under observation (e.g. app=api)
    #[arg(long, env = "PODPULSE_SELECTOR", default_value = "app=api")]
    label_selector: String,

    /// Tick interval in seconds (floored at 0.1)
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Run duration in seconds (0 = until Ctrl-C)
    #[arg(long, default_value_t = 0)]
    duration: u64,

    /// Free-form scenario label carried into event notes and the summary
    #[arg(long, default_value = "")]
    scenario: String,

    /// Output file for the event log
    #[arg(long, default_value = "results/monitor.ndjson")]
    out: PathBuf,

    /// Event log encoding
    #[arg(long, value_enum, default_value_t = LogFormat::Ndjson)]
    format: LogFormat,

    /// Serve /healthz and /metrics on this port
    #[arg(long, env = "PODPULSE_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    info!("Starting podpulse");

    // Registers the global registry before the endpoint can serve it
    let _metrics = MonitorMetrics::new();

    if let Some(port) = cli.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = api::serve(port).await {
                warn!(error = %e, "Metrics server stopped");
            }
        });
    }

    let client = Client::try_default()
        .await
        .context("Failed to build Kubernetes client")?;
    let source = KubeSource::new(client);

    let sink: Box<dyn EventSink> = match cli.format {
        LogFormat::Ndjson => Box::new(
            NdjsonSink::create(&cli.out)
                .with_context(|| format!("Failed to open event log {}", cli.out.display()))?,
        ),
        LogFormat::Csv => Box::new(
            CsvSink::create(&cli.out)
                .with_context(|| format!("Failed to open event log {}", cli.out.display()))?,
        ),
    };

    let config = MonitorConfig {
        namespace: cli.namespace,
        label_selector: cli.label_selector,
        deployment: cli.deployment_name,
        interval: Duration::from_secs_f64(cli.interval.max(0.0)),
        duration: (cli.duration > 0).then(|| Duration::from_secs(cli.duration)),
        scenario: cli.scenario,
        summary_path: cli.out.with_extension("summary.json"),
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let monitor = Monitor::new(source, SharedSink::new(sink), config);
    let summary = monitor
        .run(shutdown_rx)
        .await
        .context("Monitoring run failed")?;

    info!(
        samples = summary.samples,
        scale_events = summary.scale_events,
        request_waits = summary.request_wait_count,
        max_cpu_pct = summary.max_cpu_pct_seen,
        "Run complete"
    );

    Ok(())
}
