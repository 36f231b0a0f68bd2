//! Report sinks
//!
//! A run hands its [`RunReport`] to every configured sink. Sinks decide how
//! the report is persisted; a failing sink never affects the run itself.

use crate::models::RunReport;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for completed run reports
pub trait ReportSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn publish(&self, report: &RunReport) -> Result<()>;
}

/// Writes the latest run report to a JSON file
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonFileSink {
    fn name(&self) -> &str {
        "json_file"
    }

    fn publish(&self, report: &RunReport) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create report directory")?;
        }

        let content = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

        // Write then rename so readers never observe a partial report
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).context("Failed to write report file")?;
        std::fs::rename(&tmp_path, &self.path).context("Failed to move report file")?;

        debug!(path = %self.path.display(), "Wrote run report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterStatus, ClusterSummary};
    use chrono::Utc;
    use tempfile::TempDir;

    fn report() -> RunReport {
        RunReport {
            summary: ClusterSummary {
                analysis_time: Utc::now(),
                execution_duration_seconds: 0.5,
                namespace_count: 0,
                total_workloads: 0,
                total_issues: 0,
                status: ClusterStatus::Healthy,
            },
            namespaces: vec![],
            failures: vec![],
            error: None,
        }
    }

    #[test]
    fn test_json_file_sink_writes_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("latest.json");
        let sink = JsonFileSink::new(&path);

        let report = report();
        sink.publish(&report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: RunReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, report);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_file_sink_overwrites_previous_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latest.json");
        let sink = JsonFileSink::new(&path);

        sink.publish(&report()).unwrap();
        let mut second = report();
        second.error = Some("failed to list namespaces: forbidden".to_string());
        sink.publish(&second).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("forbidden"));
    }
}
