//! Kubernetes-backed cluster source
//!
//! Pods and deployments come from the core APIs; per-pod usage comes
//! from `metrics.k8s.io/v1beta1` (metrics-server), queried as a
//! `DynamicObject` since the metrics API has no typed binding.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DynamicObject, ListParams};
use kube::discovery::ApiResource;
use kube::{Client, ResourceExt};

use super::{ClusterSource, RawPodMetrics};
use crate::error::MonitorError;

/// `ClusterSource` over a live API server connection
#[derive(Clone)]
pub struct KubeSource {
    client: Client,
}

impl KubeSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pod_metrics_resource() -> ApiResource {
        ApiResource {
            group: "metrics.k8s.io".into(),
            version: "v1beta1".into(),
            api_version: "metrics.k8s.io/v1beta1".into(),
            kind: "PodMetrics".into(),
            plural: "pods".into(),
        }
    }
}

#[async_trait]
impl ClusterSource for KubeSource {
    async fn list_selected_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<String>, MonitorError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(label_selector);

        let pods = api
            .list(&lp)
            .await
            .map_err(|e| MonitorError::fetch("pod list", e))?;

        Ok(pods.into_iter().map(|p| p.name_any()).collect())
    }

    async fn deployment_replicas(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<i32, MonitorError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);

        let deployment = api
            .get(name)
            .await
            .map_err(|e| MonitorError::fetch("deployment status", e))?;

        Ok(deployment
            .status
            .and_then(|s| s.replicas)
            .unwrap_or_default())
    }

    async fn pod_metrics(&self, namespace: &str) -> Result<Vec<RawPodMetrics>, MonitorError> {
        let ar = Self::pod_metrics_resource();
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);

        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| MonitorError::fetch("pod metrics", e))?;

        let mut results = Vec::new();
        for item in list {
            let pod_name = item.name_any();

            // One usage entry per PodMetrics object, first container.
            let usage = item
                .data
                .get("containers")
                .and_then(|c| c.as_array())
                .and_then(|a| a.first())
                .and_then(|c| c.get("usage"));

            let Some(usage) = usage else {
                continue;
            };

            let cpu = usage
                .get("cpu")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let memory = usage
                .get("memory")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            results.push(RawPodMetrics {
                pod_name,
                cpu,
                memory,
            });
        }

        Ok(results)
    }
}
