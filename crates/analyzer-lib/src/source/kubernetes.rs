//! Kubernetes API backed workload source

use super::{workload_from_deployment, WorkloadSource};
use crate::models::WorkloadSpec;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// Lists namespaces and deployments through the Kubernetes API
#[derive(Clone)]
pub struct KubeWorkloadSource {
    client: Client,
}

impl KubeWorkloadSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using in-cluster configuration or the local kubeconfig
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl WorkloadSource for KubeWorkloadSource {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespaces = api
            .list(&ListParams::default())
            .await
            .context("Failed to list namespaces")?;

        Ok(namespaces.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadSpec>> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployments = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Failed to list deployments in {}", namespace))?;

        debug!(
            namespace = %namespace,
            deployments = deployments.items.len(),
            "Listed deployments"
        );

        Ok(deployments.items.iter().map(workload_from_deployment).collect())
    }
}
