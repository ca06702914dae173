//! Core data models for the monitor

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CPU usage for a single selected pod, in millicores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodUsage {
    pub pod_name: String,
    pub cpu_millicores: f64,
}

/// Normalized result of one tick's control-plane queries.
///
/// `pod_usage` preserves the order the metrics API returned and only
/// ever contains pods from `selected_pod_names`; usage entries for
/// unrelated pods in the namespace are dropped during collection.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub selected_pod_names: BTreeSet<String>,
    /// Pod count derived from the label-selector listing
    pub replica_count: i32,
    /// Replica count from deployment status, authoritative for scale events.
    /// Falls back to `replica_count` when the deployment read fails.
    pub deployment_replica_count: i32,
    pub pod_usage: Vec<PodUsage>,
}

impl Snapshot {
    /// Arithmetic mean of collected per-pod millicores, `None` when no
    /// pod reported usage this tick
    pub fn mean_cpu_millicores(&self) -> Option<f64> {
        if self.pod_usage.is_empty() {
            return None;
        }
        let sum: f64 = self.pod_usage.iter().map(|p| p.cpu_millicores).sum();
        Some(sum / self.pod_usage.len() as f64)
    }
}

/// A single derived monitoring event.
///
/// Write-once: an event is never mutated after emission, corrections
/// appear as new events. The serde tag makes the NDJSON encoding a
/// flat object with an `event_type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    /// Per-pod CPU usage sample. `cpu_pct` is millicores/1000 * 100,
    /// deliberately not clamped at the source.
    PodUsage {
        timestamp: DateTime<Utc>,
        replica_count: i32,
        pod_name: String,
        cpu_m: f64,
        cpu_pct: f64,
        notes: String,
    },
    /// Mean CPU across selected pods crossed the 70% floor
    CpuAlert {
        timestamp: DateTime<Utc>,
        replica_count: i32,
        cpu_pct: f64,
        notes: String,
    },
    /// Mean CPU across selected pods crossed the 100% ceiling
    CpuCritical {
        timestamp: DateTime<Utc>,
        replica_count: i32,
        cpu_pct: f64,
        notes: String,
    },
    /// Every selected pod at or above 100% CPU: requests are queueing
    RequestWait {
        timestamp: DateTime<Utc>,
        replica_count: i32,
        notes: String,
    },
    /// Deployment replica count changed between consecutive ticks
    ScaleEvent {
        timestamp: DateTime<Utc>,
        replica_count: i32,
        replicas_before: i32,
        replicas_after: i32,
        notes: String,
    },
}

impl Event {
    /// The wire name of this event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Event::PodUsage { .. } => "pod_usage",
            Event::CpuAlert { .. } => "cpu_alert",
            Event::CpuCritical { .. } => "cpu_critical",
            Event::RequestWait { .. } => "request_wait",
            Event::ScaleEvent { .. } => "scale_event",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::PodUsage { timestamp, .. }
            | Event::CpuAlert { timestamp, .. }
            | Event::CpuCritical { timestamp, .. }
            | Event::RequestWait { timestamp, .. }
            | Event::ScaleEvent { timestamp, .. } => *timestamp,
        }
    }

    pub fn replica_count(&self) -> i32 {
        match self {
            Event::PodUsage { replica_count, .. }
            | Event::CpuAlert { replica_count, .. }
            | Event::CpuCritical { replica_count, .. }
            | Event::RequestWait { replica_count, .. }
            | Event::ScaleEvent { replica_count, .. } => *replica_count,
        }
    }
}

/// Aggregate written once at run termination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Free-form scenario label, e.g. "without_hpa" / "with_hpa"
    pub scenario: String,
    pub first_cpu_alert_ts: Option<DateTime<Utc>>,
    pub first_cpu_critical_ts: Option<DateTime<Utc>>,
    pub request_wait_count: u64,
    pub scale_events: u64,
    pub max_cpu_pct_seen: f64,
    pub samples: u64,
}

impl RunSummary {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    /// Fold one emitted event into the summary
    pub fn record(&mut self, event: &Event) {
        match event {
            Event::PodUsage { cpu_pct, .. } => {
                if *cpu_pct > self.max_cpu_pct_seen {
                    self.max_cpu_pct_seen = *cpu_pct;
                }
            }
            Event::CpuAlert { timestamp, .. } => {
                self.first_cpu_alert_ts.get_or_insert(*timestamp);
            }
            Event::CpuCritical { timestamp, .. } => {
                self.first_cpu_critical_ts.get_or_insert(*timestamp);
            }
            Event::RequestWait { .. } => {
                self.request_wait_count += 1;
            }
            Event::ScaleEvent { .. } => {
                self.scale_events += 1;
            }
        }
    }
}

/// Mutable state carried across ticks, owned by the run loop.
///
/// `last_replica_count` lives here instead of in a global so the
/// derivation engine stays a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct RunState {
    pub last_replica_count: Option<i32>,
    pub summary: RunSummary,
}

impl RunState {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            last_replica_count: None,
            summary: RunSummary::new(scenario),
        }
    }
}
