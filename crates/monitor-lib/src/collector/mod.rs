//! Snapshot collection from the cluster control plane
//!
//! One `Snapshot` per tick, built from three independent sub-fetches:
//! the label-selected pod list, cluster-wide pod metrics, and the
//! deployment's status replica count. The pod list and metrics are
//! hard dependencies (their failure skips the tick); the deployment
//! read degrades to the selector-derived pod count.

mod kube_source;

pub use kube_source::KubeSource;

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::MonitorError;
use crate::models::{PodUsage, Snapshot};
use crate::units::{cpu_to_millicores, mem_to_mebibytes};

pub use async_trait::async_trait;

/// Raw per-pod usage as reported by the metrics API, before unit
/// normalization or selector filtering
#[derive(Debug, Clone)]
pub struct RawPodMetrics {
    pub pod_name: String,
    /// CPU quantity string, e.g. "250000000n" or "150m"
    pub cpu: String,
    /// Memory quantity string, e.g. "128Mi"
    pub memory: String,
}

/// Control-plane query interface.
///
/// Transport is opaque: `KubeSource` talks to a real API server, tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// Names of pods matching the label selector in the namespace
    async fn list_selected_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<String>, MonitorError>;

    /// Replica count from the deployment's status
    async fn deployment_replicas(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<i32, MonitorError>;

    /// Per-pod usage for the whole namespace (the caller filters)
    async fn pod_metrics(&self, namespace: &str) -> Result<Vec<RawPodMetrics>, MonitorError>;
}

/// Collects one snapshot per tick from a `ClusterSource`
pub struct SnapshotCollector<S: ClusterSource> {
    source: S,
    namespace: String,
    label_selector: String,
    deployment: String,
}

impl<S: ClusterSource> SnapshotCollector<S> {
    pub fn new(
        source: S,
        namespace: impl Into<String>,
        label_selector: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            source,
            namespace: namespace.into(),
            label_selector: label_selector.into(),
            deployment: deployment.into(),
        }
    }

    /// Run the three sub-fetches and normalize the result.
    ///
    /// Errors from the pod list or the metrics fetch propagate (the
    /// caller skips the tick). A failed deployment read falls back to
    /// the selector-derived pod count. A malformed usage string drops
    /// only that pod.
    pub async fn collect(&self) -> Result<Snapshot, MonitorError> {
        let pod_names = self
            .source
            .list_selected_pods(&self.namespace, &self.label_selector)
            .await?;
        let selected_pod_names: BTreeSet<String> = pod_names.into_iter().collect();
        let replica_count = selected_pod_names.len() as i32;

        let raw_metrics = self.source.pod_metrics(&self.namespace).await?;

        let deployment_replica_count = match self
            .source
            .deployment_replicas(&self.namespace, &self.deployment)
            .await
        {
            Ok(replicas) => replicas,
            Err(e) => {
                warn!(
                    namespace = %self.namespace,
                    deployment = %self.deployment,
                    error = %e,
                    "Deployment status unavailable, using selector pod count"
                );
                replica_count
            }
        };

        let mut pod_usage = Vec::with_capacity(raw_metrics.len());
        for raw in raw_metrics {
            // Usage entries for pods outside the label selector must
            // never leak into the snapshot.
            if !selected_pod_names.contains(&raw.pod_name) {
                continue;
            }

            match cpu_to_millicores(&raw.cpu) {
                Ok(cpu_millicores) => {
                    debug!(
                        namespace = %self.namespace,
                        pod = %raw.pod_name,
                        cpu_m = cpu_millicores,
                        mem_mib = mem_to_mebibytes(&raw.memory),
                        "Collected pod usage"
                    );
                    pod_usage.push(PodUsage {
                        pod_name: raw.pod_name,
                        cpu_millicores,
                    });
                }
                Err(e) => {
                    warn!(
                        namespace = %self.namespace,
                        pod = %raw.pod_name,
                        raw_cpu = %raw.cpu,
                        error = %e,
                        "Dropping pod with unparseable usage"
                    );
                }
            }
        }

        Ok(Snapshot {
            timestamp: Utc::now(),
            selected_pod_names,
            replica_count,
            deployment_replica_count,
            pod_usage,
        })
    }
}
