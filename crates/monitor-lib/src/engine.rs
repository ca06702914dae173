//! Event derivation
//!
//! Pure function of (snapshot, last replica count): no clock, no IO,
//! no hidden state. The emission order is part of the contract — it
//! is the order records land in the event log.

use crate::models::{Event, Snapshot};

/// Mean CPU percentage at which an aggregate alert fires
pub const CPU_ALERT_PCT: f64 = 70.0;

/// Mean CPU percentage at which an aggregate critical fires
pub const CPU_CRITICAL_PCT: f64 = 100.0;

/// Per-pod CPU percentage at which a pod counts as saturated
pub const SATURATION_PCT: f64 = 100.0;

/// Derive this tick's events and the replica count to carry forward.
///
/// Emission order: per-pod usage (collector order), scale transition,
/// aggregate alert, aggregate critical, request-wait. The alert and
/// critical checks are independent — the floor and the ceiling can
/// both fire in the same tick.
pub fn derive_events(
    snapshot: &Snapshot,
    last_replica_count: Option<i32>,
    scenario: &str,
) -> (Vec<Event>, i32) {
    let mut events = Vec::new();
    let ts = snapshot.timestamp;
    let replica_count = snapshot.replica_count;

    // 1) Per-pod usage, unclamped percentages
    let mut all_saturated = true;
    for pod in &snapshot.pod_usage {
        let cpu_pct = (pod.cpu_millicores / 1000.0) * 100.0;
        if cpu_pct < SATURATION_PCT {
            all_saturated = false;
        }
        events.push(Event::PodUsage {
            timestamp: ts,
            replica_count,
            pod_name: pod.pod_name.clone(),
            cpu_m: round3(pod.cpu_millicores),
            cpu_pct,
            notes: scenario.to_string(),
        });
    }

    // 2) Scale transition, deployment count only. Never on the first
    // tick: with no prior observation there is nothing to compare.
    let current = snapshot.deployment_replica_count;
    if let Some(last) = last_replica_count {
        if current != last {
            events.push(Event::ScaleEvent {
                timestamp: ts,
                replica_count: current,
                replicas_before: last,
                replicas_after: current,
                notes: format!("replicas changed from {last} to {current} ({scenario})"),
            });
        }
    }

    // 3) + 4) Aggregate thresholds over the mean of collected pods
    if let Some(avg_m) = snapshot.mean_cpu_millicores() {
        let avg_pct = (avg_m / 1000.0) * 100.0;

        if avg_pct >= CPU_ALERT_PCT {
            events.push(Event::CpuAlert {
                timestamp: ts,
                replica_count,
                cpu_pct: avg_pct,
                notes: format!("mean CPU >= 70% ({scenario})"),
            });
        }
        if avg_pct >= CPU_CRITICAL_PCT {
            events.push(Event::CpuCritical {
                timestamp: ts,
                replica_count,
                cpu_pct: avg_pct,
                notes: format!("mean CPU >= 100% ({scenario})"),
            });
        }
    }

    // 5) Queueing heuristic: strict, one pod under 100% suppresses it
    if replica_count > 0 && !snapshot.pod_usage.is_empty() && all_saturated {
        events.push(Event::RequestWait {
            timestamp: ts,
            replica_count,
            notes: format!("all replicas at ~100% CPU ({scenario})"),
        });
    }

    (events, current)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
