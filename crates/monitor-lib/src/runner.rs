//! Monitoring run loop
//!
//! Drives ticks at a fixed interval until the configured duration
//! elapses or a shutdown signal arrives. One tick runs to completion
//! (collect, derive, sink) before the next begins; a slow fetch delays
//! the next tick but never overlaps it. On every exit path the run
//! summary is flushed exactly once.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::collector::{ClusterSource, SnapshotCollector};
use crate::engine::derive_events;
use crate::error::MonitorError;
use crate::models::{RunState, RunSummary};
use crate::observability::MonitorMetrics;
use crate::sink::SharedSink;

/// Floor on the tick interval to prevent a runaway tight loop
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Run parameters for one monitoring run
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub namespace: String,
    pub label_selector: String,
    pub deployment: String,
    /// Tick cadence; values below [`MIN_INTERVAL`] are raised to it
    pub interval: Duration,
    /// `None` runs until cancelled
    pub duration: Option<Duration>,
    /// Free-form label carried in event notes and the summary
    pub scenario: String,
    /// Where the terminal summary JSON is written
    pub summary_path: PathBuf,
}

/// One monitoring run over a cluster source and an event sink
pub struct Monitor<S: ClusterSource> {
    collector: SnapshotCollector<S>,
    sink: SharedSink,
    config: MonitorConfig,
    metrics: MonitorMetrics,
}

impl<S: ClusterSource> Monitor<S> {
    pub fn new(source: S, sink: SharedSink, config: MonitorConfig) -> Self {
        let collector = SnapshotCollector::new(
            source,
            config.namespace.clone(),
            config.label_selector.clone(),
            config.deployment.clone(),
        );
        Self {
            collector,
            sink,
            config,
            metrics: MonitorMetrics::new(),
        }
    }

    /// Run until the duration elapses, the shutdown channel fires, or
    /// the sink fails. Returns the final summary, which has already
    /// been flushed to `summary_path`.
    pub async fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunSummary, MonitorError> {
        let interval = self.config.interval.max(MIN_INTERVAL);
        let end = self.config.duration.map(|d| Instant::now() + d);
        let mut state = RunState::new(&self.config.scenario);

        info!(
            namespace = %self.config.namespace,
            deployment = %self.config.deployment,
            selector = %self.config.label_selector,
            interval_ms = interval.as_millis() as u64,
            "Starting monitoring run"
        );

        let mut fatal: Option<MonitorError> = None;

        loop {
            // Duration is checked at tick boundaries only, never
            // mid-tick.
            if let Some(end) = end {
                if Instant::now() >= end {
                    info!("Run duration elapsed");
                    break;
                }
            }

            if let Err(e) = self.tick(&mut state).await {
                fatal = Some(e);
                break;
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown.recv() => {
                    info!("Shutdown requested, stopping monitoring run");
                    break;
                }
            }
        }

        // Exactly one summary flush per run, on every exit path. When
        // the sink already failed this is best-effort.
        let flush_result = self.flush_summary(&state.summary);

        match fatal {
            Some(e) => {
                if let Err(flush_err) = flush_result {
                    warn!(error = %flush_err, "Summary flush failed after sink error");
                }
                Err(e)
            }
            None => {
                flush_result?;
                Ok(state.summary)
            }
        }
    }

    /// Execute one tick. Fetch failures skip the tick and return Ok;
    /// only a sink failure is fatal.
    async fn tick(&self, state: &mut RunState) -> Result<(), MonitorError> {
        let snapshot = match self.collector.collect().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if let MonitorError::Fetch { resource, .. } = &e {
                    self.metrics.inc_fetch_error(resource);
                }
                self.metrics.inc_tick_skipped();
                warn!(error = %e, "Skipping tick after failed fetch");
                return Ok(());
            }
        };

        if let Some(avg_m) = snapshot.mean_cpu_millicores() {
            self.metrics.set_last_mean_cpu_pct((avg_m / 1000.0) * 100.0);
        }

        let (events, next_replica_count) =
            derive_events(&snapshot, state.last_replica_count, &self.config.scenario);

        for event in &events {
            if let Err(e) = self.sink.append(event) {
                error!(kind = event.kind(), error = %e, "Event sink failure, aborting run");
                return Err(e);
            }
            self.metrics.inc_event(event.kind());
            state.summary.record(event);
        }

        state.last_replica_count = Some(next_replica_count);
        state.summary.samples += 1;
        self.metrics.inc_tick();
        Ok(())
    }

    fn flush_summary(&self, summary: &RunSummary) -> Result<(), MonitorError> {
        let path = &self.config.summary_path;
        let mut file = crate::sink::create_log_file(path)?;

        let json =
            serde_json::to_vec_pretty(summary).map_err(|source| MonitorError::Sink {
                path: path.clone(),
                source: source.into(),
            })?;

        use std::io::Write;
        file.write_all(&json)
            .and_then(|_| file.flush())
            .map_err(|source| MonitorError::Sink {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), samples = summary.samples, "Run summary written");
        Ok(())
    }
}
