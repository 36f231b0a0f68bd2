//! Workload sources
//!
//! The analyzer only reads workload specifications; where they come from is
//! behind the [`WorkloadSource`] trait. Two implementations are provided:
//! the Kubernetes API and a static JSON snapshot.

mod convert;
mod kubernetes;
mod snapshot;

pub use self::convert::{container_from_k8s, workload_from_deployment};
pub use self::kubernetes::KubeWorkloadSource;
pub use self::snapshot::{NamespaceSnapshot, SnapshotSource};

use crate::models::WorkloadSpec;
use anyhow::Result;

pub use async_trait::async_trait;

/// Read-only access to the workloads of a cluster
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// List namespace names in the order they should be analyzed
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// List the workloads of one namespace
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadSpec>>;
}
