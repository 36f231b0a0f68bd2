//! Static snapshot workload source
//!
//! Serves a fixed, ordered set of namespaces and workloads. Snapshots can be
//! loaded from JSON files for offline analysis.

use super::WorkloadSource;
use crate::models::WorkloadSpec;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Workloads of one namespace in a snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceSnapshot {
    pub name: String,
    #[serde(default)]
    pub workloads: Vec<WorkloadSpec>,
}

/// In-memory workload source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSource {
    #[serde(default)]
    namespaces: Vec<NamespaceSnapshot>,
}

impl SnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace, replacing any existing one with the same name
    pub fn with_namespace(mut self, name: impl Into<String>, workloads: Vec<WorkloadSpec>) -> Self {
        let name = name.into();
        self.namespaces.retain(|ns| ns.name != name);
        self.namespaces.push(NamespaceSnapshot { name, workloads });
        self
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn namespaces(&self) -> &[NamespaceSnapshot] {
        &self.namespaces
    }
}

#[async_trait]
impl WorkloadSource for SnapshotSource {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        Ok(self.namespaces.iter().map(|ns| ns.name.clone()).collect())
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadSpec>> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == namespace)
            .map(|ns| ns.workloads.clone())
            .ok_or_else(|| anyhow::anyhow!("namespace {} not found in snapshot", namespace))
    }
}
