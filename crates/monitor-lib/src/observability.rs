//! Prometheus metrics for the monitor
//!
//! Registered once in a process-global registry; `MonitorMetrics` is
//! a cheap cloneable handle over it.

use prometheus::{
    register_gauge, register_int_counter, register_int_counter_vec, Gauge, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;

static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    ticks_total: IntCounter,
    ticks_skipped_total: IntCounter,
    events_emitted_total: IntCounterVec,
    fetch_errors_total: IntCounterVec,
    last_mean_cpu_pct: Gauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            ticks_total: register_int_counter!(
                "podpulse_ticks_total",
                "Completed monitoring ticks"
            )
            .expect("Failed to register ticks_total"),

            ticks_skipped_total: register_int_counter!(
                "podpulse_ticks_skipped_total",
                "Ticks skipped due to a failed control-plane fetch"
            )
            .expect("Failed to register ticks_skipped_total"),

            events_emitted_total: register_int_counter_vec!(
                "podpulse_events_emitted_total",
                "Events appended to the log, by kind",
                &["kind"]
            )
            .expect("Failed to register events_emitted_total"),

            fetch_errors_total: register_int_counter_vec!(
                "podpulse_fetch_errors_total",
                "Control-plane fetch failures, by resource",
                &["resource"]
            )
            .expect("Failed to register fetch_errors_total"),

            last_mean_cpu_pct: register_gauge!(
                "podpulse_last_mean_cpu_pct",
                "Mean CPU percentage across selected pods in the last tick"
            )
            .expect("Failed to register last_mean_cpu_pct"),
        }
    }
}

/// Handle to the global monitor metrics
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_tick(&self) {
        self.inner().ticks_total.inc();
    }

    pub fn inc_tick_skipped(&self) {
        self.inner().ticks_skipped_total.inc();
    }

    pub fn inc_event(&self, kind: &str) {
        self.inner()
            .events_emitted_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn inc_fetch_error(&self, resource: &str) {
        self.inner()
            .fetch_errors_total
            .with_label_values(&[resource])
            .inc();
    }

    pub fn set_last_mean_cpu_pct(&self, pct: f64) {
        self.inner().last_mean_cpu_pct.set(pct);
    }
}
