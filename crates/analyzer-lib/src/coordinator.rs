//! Run coordination
//!
//! A run lists namespaces, aggregates each one, rolls the results into a
//! [`ClusterSummary`] and hands the [`RunReport`] to every sink. Runs never
//! overlap; scheduling repeated runs is left to the caller.

use crate::aggregator::{NamespaceAggregator, DEFAULT_CALL_TIMEOUT};
use crate::error::{AnalysisError, Operation, Result};
use crate::models::{
    ClusterStatus, ClusterSummary, NamespaceFailure, NamespaceReport, RunReport,
};
use crate::report::ReportSink;
use crate::rules::RuleSet;
use crate::source::WorkloadSource;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Configuration for analysis runs
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Bound on each call to the workload source
    pub call_timeout: Duration,
    /// Only analyze these namespaces (empty means all)
    pub include_namespaces: Vec<String>,
    /// Never analyze these namespaces
    pub exclude_namespaces: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            include_namespaces: Vec::new(),
            exclude_namespaces: Vec::new(),
        }
    }
}

impl RunConfig {
    fn selects(&self, namespace: &str) -> bool {
        let included = self.include_namespaces.is_empty()
            || self.include_namespaces.iter().any(|ns| ns == namespace);
        included && !self.exclude_namespaces.iter().any(|ns| ns == namespace)
    }
}

/// Runs the analysis once per call to [`RunCoordinator::run_once`]
pub struct RunCoordinator {
    source: Arc<dyn WorkloadSource>,
    rules: RuleSet,
    sinks: Vec<Arc<dyn ReportSink>>,
    config: RunConfig,
    running: Mutex<()>,
}

impl RunCoordinator {
    pub fn new(source: Arc<dyn WorkloadSource>, rules: RuleSet, config: RunConfig) -> Self {
        Self {
            source,
            rules,
            sinks: Vec::new(),
            config,
            running: Mutex::new(()),
        }
    }

    /// Add a sink that receives every run report
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Analyze the cluster once
    ///
    /// Fails only when another run is still in progress. Collaborator
    /// failures are recorded in the returned report instead.
    pub async fn run_once(&self) -> Result<RunReport> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| AnalysisError::RunInProgress)?;

        let started = Instant::now();
        let analysis_time = Utc::now();
        info!("Starting security analysis");

        let mut namespaces = Vec::new();
        let mut failures = Vec::new();
        let mut error = None;

        match self.list_namespaces().await {
            Ok(names) => {
                let aggregator = NamespaceAggregator::new(self.source.as_ref(), &self.rules)
                    .with_call_timeout(self.config.call_timeout);

                for namespace in names.into_iter().filter(|ns| self.config.selects(ns)) {
                    match aggregator.analyze(&namespace).await {
                        Ok(report) => namespaces.push(report),
                        Err(e) => {
                            warn!(namespace = %namespace, error = %e, "Skipping namespace");
                            failures.push(NamespaceFailure {
                                namespace,
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Aborting analysis run");
                error = Some(e.to_string());
            }
        }

        let report = RunReport {
            summary: summarize(analysis_time, started.elapsed(), &namespaces),
            namespaces,
            failures,
            error,
        };

        self.publish(&report);
        Ok(report)
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, self.source.list_namespaces()).await {
            Ok(Ok(names)) => {
                debug!(namespaces = names.len(), "Listed namespaces");
                Ok(names)
            }
            Ok(Err(e)) => Err(AnalysisError::unavailable(Operation::ListNamespaces, &e)),
            Err(_) => Err(AnalysisError::timed_out(Operation::ListNamespaces, timeout)),
        }
    }

    fn publish(&self, report: &RunReport) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(report) {
                warn!(sink = %sink.name(), error = %e, "Failed to publish run report");
            }
        }
    }
}

/// Roll namespace reports up into a cluster summary
pub fn summarize(
    analysis_time: DateTime<Utc>,
    duration: Duration,
    namespaces: &[NamespaceReport],
) -> ClusterSummary {
    let total_issues: usize = namespaces.iter().map(|ns| ns.summary.total_issues).sum();

    ClusterSummary {
        analysis_time,
        execution_duration_seconds: duration.as_secs_f64(),
        namespace_count: namespaces.len(),
        total_workloads: namespaces.iter().map(|ns| ns.workload_count).sum(),
        total_issues,
        status: if total_issues > 0 {
            ClusterStatus::Alert
        } else {
            ClusterStatus::Healthy
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SecurityTier, WorkloadSpec};
    use crate::source::{async_trait, SnapshotSource};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Sink that keeps every published report
    #[derive(Default)]
    struct MemorySink {
        reports: StdMutex<Vec<RunReport>>,
    }

    impl ReportSink for MemorySink {
        fn name(&self) -> &str {
            "memory"
        }

        fn publish(&self, report: &RunReport) -> anyhow::Result<()> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn publish(&self, _report: &RunReport) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    /// Source whose namespace listing fails, or whose listed namespaces partly fail
    struct FlakySource {
        namespaces: std::result::Result<Vec<String>, String>,
        broken: Vec<String>,
    }

    #[async_trait]
    impl WorkloadSource for FlakySource {
        async fn list_namespaces(&self) -> anyhow::Result<Vec<String>> {
            self.namespaces.clone().map_err(|e| anyhow::anyhow!(e))
        }

        async fn list_workloads(&self, namespace: &str) -> anyhow::Result<Vec<WorkloadSpec>> {
            if self.broken.iter().any(|ns| ns == namespace) {
                anyhow::bail!("connection reset");
            }
            Ok(vec![WorkloadSpec {
                name: format!("{}-app", namespace),
                host_ipc: true,
                ..Default::default()
            }])
        }
    }

    #[tokio::test]
    async fn test_partial_failure_still_summarizes() {
        let source = FlakySource {
            namespaces: Ok(vec!["a".into(), "b".into(), "c".into()]),
            broken: vec!["b".into()],
        };
        let sink = Arc::new(MemorySink::default());
        let coordinator = RunCoordinator::new(Arc::new(source), RuleSet::default(), RunConfig::default())
            .with_sink(sink.clone());

        let report = coordinator.run_once().await.unwrap();

        assert_eq!(report.summary.namespace_count, 2);
        assert_eq!(report.summary.total_workloads, 2);
        assert_eq!(report.summary.status, ClusterStatus::Alert);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].namespace, "b");
        assert!(report.failures[0].error.contains("connection reset"));
        assert!(report.error.is_none());
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_namespace_listing_failure_aborts_run() {
        let source = FlakySource {
            namespaces: Err("forbidden".to_string()),
            broken: vec![],
        };
        let sink = Arc::new(MemorySink::default());
        let coordinator = RunCoordinator::new(Arc::new(source), RuleSet::default(), RunConfig::default())
            .with_sink(sink.clone());

        let report = coordinator.run_once().await.unwrap();

        assert_eq!(report.summary.namespace_count, 0);
        assert_eq!(report.summary.status, ClusterStatus::Healthy);
        assert_eq!(
            report.error.as_deref(),
            Some("failed to list namespaces: forbidden")
        );
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_fail_run() {
        let source = SnapshotSource::new().with_namespace("default", vec![]);
        let sink = Arc::new(MemorySink::default());
        let coordinator = RunCoordinator::new(Arc::new(source), RuleSet::default(), RunConfig::default())
            .with_sink(Arc::new(FailingSink))
            .with_sink(sink.clone());

        tokio_test::assert_ok!(coordinator.run_once().await);
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_namespace_selection() {
        let source = SnapshotSource::new()
            .with_namespace("default", vec![])
            .with_namespace("kube-system", vec![])
            .with_namespace("payments", vec![]);

        let config = RunConfig {
            exclude_namespaces: vec!["kube-system".to_string()],
            ..Default::default()
        };
        let coordinator = RunCoordinator::new(Arc::new(source.clone()), RuleSet::default(), config);
        let report = coordinator.run_once().await.unwrap();
        let names: Vec<_> = report.namespaces.iter().map(|ns| ns.namespace.as_str()).collect();
        assert_eq!(names, vec!["default", "payments"]);

        let config = RunConfig {
            include_namespaces: vec!["payments".to_string()],
            ..Default::default()
        };
        let coordinator = RunCoordinator::new(Arc::new(source), RuleSet::default(), config);
        let report = coordinator.run_once().await.unwrap();
        assert_eq!(report.namespaces.len(), 1);
        assert_eq!(report.namespaces[0].namespace, "payments");
    }

    /// Source that blocks namespace listing until released
    struct BlockingSource {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl WorkloadSource for BlockingSource {
        async fn list_namespaces(&self) -> anyhow::Result<Vec<String>> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![])
        }

        async fn list_workloads(&self, _namespace: &str) -> anyhow::Result<Vec<WorkloadSpec>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source = BlockingSource {
            entered: entered.clone(),
            release: release.clone(),
        };
        let coordinator = Arc::new(RunCoordinator::new(
            Arc::new(source),
            RuleSet::default(),
            RunConfig::default(),
        ));

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.run_once().await })
        };
        entered.notified().await;

        let second = coordinator.run_once().await;
        assert!(matches!(second, Err(AnalysisError::RunInProgress)));

        release.notify_one();
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.summary.namespace_count, 0);

        // The guard is released once the first run completes
        release.notify_one();
        tokio_test::assert_ok!(coordinator.run_once().await);
    }

    #[test]
    fn test_summarize_status() {
        let now = Utc::now();
        let healthy = summarize(now, Duration::from_millis(1500), &[]);
        assert_eq!(healthy.status, ClusterStatus::Healthy);
        assert_eq!(healthy.execution_duration_seconds, 1.5);

        let workloads = vec![WorkloadSpec {
            name: "w".to_string(),
            host_network: true,
            ..Default::default()
        }];
        let report =
            crate::aggregator::build_report("ns", &workloads, &RuleSet::default(), now);
        assert_eq!(report.recommended_tier, SecurityTier::Privileged);

        let alert = summarize(now, Duration::ZERO, &[report]);
        assert_eq!(alert.status, ClusterStatus::Alert);
        assert_eq!(alert.total_issues, 1);
        assert_eq!(alert.total_workloads, 1);
    }
}
