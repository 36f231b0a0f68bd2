//! Core data models for the security analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Pod Security Standards tier, ordered from least to most permissive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityTier {
    #[default]
    Restricted,
    Baseline,
    Privileged,
}

impl SecurityTier {
    /// All tiers in ascending permissiveness
    pub const ALL: [SecurityTier; 3] = [
        SecurityTier::Restricted,
        SecurityTier::Baseline,
        SecurityTier::Privileged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityTier::Restricted => "restricted",
            SecurityTier::Baseline => "baseline",
            SecurityTier::Privileged => "privileged",
        }
    }
}

impl std::fmt::Display for SecurityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Container-level security context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerSecurityContext {
    pub privileged: Option<bool>,
    pub run_as_non_root: Option<bool>,
    pub read_only_root_filesystem: Option<bool>,
    pub capabilities_added: BTreeSet<String>,
}

/// Security-relevant view of one container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerSpec {
    pub name: String,
    pub security_context: Option<ContainerSecurityContext>,
    /// Host ports bound by the container's declared ports
    pub host_ports: Vec<u16>,
    pub image: Option<String>,
    pub image_pull_policy: Option<String>,
    /// Whether any resource limit is declared
    pub has_resource_limits: bool,
}

impl ContainerSpec {
    pub fn is_privileged(&self) -> bool {
        self.security_context
            .as_ref()
            .and_then(|ctx| ctx.privileged)
            .unwrap_or(false)
    }

    pub fn capabilities_added(&self) -> Option<&BTreeSet<String>> {
        self.security_context
            .as_ref()
            .map(|ctx| &ctx.capabilities_added)
            .filter(|caps| !caps.is_empty())
    }
}

/// Pod-level security context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSecurityContext {
    pub run_as_non_root: Option<bool>,
    pub privileged: Option<bool>,
}

/// In-tree cloud provider volume types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloudVolumeType {
    GcePersistentDisk,
    AwsElasticBlockStore,
    AzureDisk,
    PortworxVolume,
    #[serde(rename = "scaleIO")]
    ScaleIo,
}

/// Volume declared by a workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeSpec {
    pub name: String,
    pub host_path: Option<String>,
    pub cloud_provider_volume_type: Option<CloudVolumeType>,
}

/// Security-relevant view of one workload's pod template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadSpec {
    pub name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub security_context: Option<PodSecurityContext>,
    pub host_network: bool,
    #[serde(rename = "hostPID")]
    pub host_pid: bool,
    #[serde(rename = "hostIPC")]
    pub host_ipc: bool,
    pub containers: Vec<ContainerSpec>,
    pub volumes: Vec<VolumeSpec>,
}

/// Outcome of evaluating one workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub tier: SecurityTier,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Evaluation result tagged with the workload it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadResult {
    pub workload: String,
    #[serde(flatten)]
    pub result: EvaluationResult,
}

/// Summary statistics for a namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSummary {
    pub total_issues: usize,
    pub total_recommendations: usize,
    pub percent_restricted: f64,
}

/// Security posture of a single namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceReport {
    pub namespace: String,
    pub timestamp: DateTime<Utc>,
    pub recommended_tier: SecurityTier,
    pub workload_count: usize,
    pub tier_distribution: BTreeMap<SecurityTier, usize>,
    pub workloads: Vec<WorkloadResult>,
    pub summary: NamespaceSummary,
}

/// Overall cluster status for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Healthy,
    Alert,
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterStatus::Healthy => write!(f, "healthy"),
            ClusterStatus::Alert => write!(f, "alert"),
        }
    }
}

/// Cluster-wide roll-up of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub analysis_time: DateTime<Utc>,
    pub execution_duration_seconds: f64,
    pub namespace_count: usize,
    pub total_workloads: usize,
    pub total_issues: usize,
    pub status: ClusterStatus,
}

/// A namespace that could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceFailure {
    pub namespace: String,
    pub error: String,
}

/// Everything produced by one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: ClusterSummary,
    pub namespaces: Vec<NamespaceReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<NamespaceFailure>,
    /// Set when the run was aborted before any namespace was analyzed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
