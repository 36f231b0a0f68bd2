//! Observability infrastructure for the security analyzer
//!
//! Provides:
//! - Prometheus metrics (run latency, namespaces analyzed, workloads per tier, issues)
//! - Structured JSON logging of run results with tracing

use crate::models::{ClusterStatus, NamespaceReport, RunReport, SecurityTier};
use crate::report::ReportSink;
use anyhow::Result;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, register_int_gauge_vec,
    Histogram, IntCounter, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for run durations (in seconds)
const RUN_DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AnalyzerMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct AnalyzerMetricsInner {
    run_duration_seconds: Histogram,
    runs_total: IntCounter,
    aborted_runs_total: IntCounter,
    namespaces_analyzed: IntGauge,
    namespace_failures_total: IntCounter,
    workloads_by_tier: IntGaugeVec,
    issues: IntGauge,
    last_run_timestamp_seconds: IntGauge,
    cluster_alert: IntGauge,
}

impl AnalyzerMetricsInner {
    fn new() -> Self {
        Self {
            run_duration_seconds: register_histogram!(
                "security_analyzer_run_duration_seconds",
                "Time spent analyzing the cluster in one run",
                RUN_DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register run_duration_seconds"),

            runs_total: register_int_counter!(
                "security_analyzer_runs_total",
                "Total number of analysis runs"
            )
            .expect("Failed to register runs_total"),

            aborted_runs_total: register_int_counter!(
                "security_analyzer_aborted_runs_total",
                "Total number of runs aborted because namespaces could not be listed"
            )
            .expect("Failed to register aborted_runs_total"),

            namespaces_analyzed: register_int_gauge!(
                "security_analyzer_namespaces_analyzed",
                "Number of namespaces analyzed in the last run"
            )
            .expect("Failed to register namespaces_analyzed"),

            namespace_failures_total: register_int_counter!(
                "security_analyzer_namespace_failures_total",
                "Total number of namespaces that could not be analyzed"
            )
            .expect("Failed to register namespace_failures_total"),

            workloads_by_tier: register_int_gauge_vec!(
                "security_analyzer_workloads",
                "Number of workloads per security tier in the last run",
                &["tier"]
            )
            .expect("Failed to register workloads_by_tier"),

            issues: register_int_gauge!(
                "security_analyzer_issues",
                "Number of issues found in the last run"
            )
            .expect("Failed to register issues"),

            last_run_timestamp_seconds: register_int_gauge!(
                "security_analyzer_last_run_timestamp_seconds",
                "Unix timestamp of the last completed run"
            )
            .expect("Failed to register last_run_timestamp_seconds"),

            cluster_alert: register_int_gauge!(
                "security_analyzer_cluster_alert",
                "1 if the last run reported alert status, 0 otherwise"
            )
            .expect("Failed to register cluster_alert"),
        }
    }
}

/// Analyzer metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AnalyzerMetrics {
    _private: (),
}

impl Default for AnalyzerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AnalyzerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AnalyzerMetricsInner {
        GLOBAL_METRICS.get_or_init(AnalyzerMetricsInner::new)
    }

    /// Record the outcome of a run
    pub fn record_run(&self, report: &RunReport) {
        let inner = self.inner();
        let summary = &report.summary;

        inner.runs_total.inc();
        inner
            .run_duration_seconds
            .observe(summary.execution_duration_seconds);
        inner.last_run_timestamp_seconds.set(summary.analysis_time.timestamp());

        if report.is_aborted() {
            inner.aborted_runs_total.inc();
        }
        inner
            .namespace_failures_total
            .inc_by(report.failures.len() as u64);

        inner.namespaces_analyzed.set(summary.namespace_count as i64);
        inner.issues.set(summary.total_issues as i64);
        inner
            .cluster_alert
            .set(i64::from(summary.status == ClusterStatus::Alert));

        for tier in SecurityTier::ALL {
            let count: usize = report
                .namespaces
                .iter()
                .map(|ns| ns.tier_distribution.get(&tier).copied().unwrap_or(0))
                .sum();
            inner
                .workloads_by_tier
                .with_label_values(&[tier.as_str()])
                .set(count as i64);
        }
    }
}

impl ReportSink for AnalyzerMetrics {
    fn name(&self) -> &str {
        "metrics"
    }

    fn publish(&self, report: &RunReport) -> Result<()> {
        self.record_run(report);
        Ok(())
    }
}

/// Structured logger for analysis events
///
/// Provides consistent JSON-formatted logging for namespace reports,
/// failures and run summaries.
#[derive(Clone)]
pub struct StructuredLogger {
    cluster: String,
}

impl StructuredLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    /// Log the posture of one namespace
    pub fn log_namespace(&self, report: &NamespaceReport) {
        let count = |tier: SecurityTier| report.tier_distribution.get(&tier).copied().unwrap_or(0);

        info!(
            event = "namespace_analyzed",
            cluster = %self.cluster,
            namespace = %report.namespace,
            recommended_tier = %report.recommended_tier,
            workload_count = report.workload_count,
            restricted_workloads = count(SecurityTier::Restricted),
            baseline_workloads = count(SecurityTier::Baseline),
            privileged_workloads = count(SecurityTier::Privileged),
            total_issues = report.summary.total_issues,
            total_recommendations = report.summary.total_recommendations,
            percent_restricted = report.summary.percent_restricted,
            "Namespace analyzed"
        );

        for entry in &report.workloads {
            if entry.result.issues.is_empty() && entry.result.recommendations.is_empty() {
                continue;
            }
            debug!(
                event = "workload_findings",
                cluster = %self.cluster,
                namespace = %report.namespace,
                workload = %entry.workload,
                tier = %entry.result.tier,
                issues = ?entry.result.issues,
                recommendations = ?entry.result.recommendations,
                "Workload findings"
            );
        }
    }

    /// Log a namespace that could not be analyzed
    pub fn log_namespace_failure(&self, namespace: &str, error: &str) {
        warn!(
            event = "namespace_failed",
            cluster = %self.cluster,
            namespace = %namespace,
            error = %error,
            "Namespace analysis failed"
        );
    }

    /// Log a run aborted before any namespace was analyzed
    pub fn log_run_failure(&self, error: &str) {
        warn!(
            event = "analysis_failed",
            cluster = %self.cluster,
            error = %error,
            "Security analysis aborted"
        );
    }

    /// Log the cluster-wide summary of a run
    pub fn log_summary(&self, report: &RunReport) {
        let summary = &report.summary;

        match summary.status {
            ClusterStatus::Alert => {
                warn!(
                    event = "analysis_complete",
                    cluster = %self.cluster,
                    analysis_time = %summary.analysis_time.to_rfc3339(),
                    execution_duration_seconds = summary.execution_duration_seconds,
                    namespace_count = summary.namespace_count,
                    failed_namespaces = report.failures.len(),
                    total_workloads = summary.total_workloads,
                    total_issues = summary.total_issues,
                    status = %summary.status,
                    "Security analysis complete with findings"
                );
            }
            ClusterStatus::Healthy => {
                info!(
                    event = "analysis_complete",
                    cluster = %self.cluster,
                    analysis_time = %summary.analysis_time.to_rfc3339(),
                    execution_duration_seconds = summary.execution_duration_seconds,
                    namespace_count = summary.namespace_count,
                    failed_namespaces = report.failures.len(),
                    total_workloads = summary.total_workloads,
                    total_issues = summary.total_issues,
                    status = %summary.status,
                    "Security analysis complete"
                );
            }
        }
    }

    /// Log analyzer startup
    pub fn log_startup(&self, version: &str, interval_secs: u64) {
        info!(
            event = "analyzer_started",
            cluster = %self.cluster,
            analyzer_version = %version,
            interval_secs = interval_secs,
            "Security analyzer started"
        );
    }

    /// Log analyzer shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "analyzer_shutdown",
            cluster = %self.cluster,
            reason = %reason,
            "Security analyzer shutting down"
        );
    }
}

impl ReportSink for StructuredLogger {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, report: &RunReport) -> Result<()> {
        if let Some(error) = &report.error {
            self.log_run_failure(error);
        }
        for namespace in &report.namespaces {
            self.log_namespace(namespace);
        }
        for failure in &report.failures {
            self.log_namespace_failure(&failure.namespace, &failure.error);
        }
        self.log_summary(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClusterSummary;
    use chrono::Utc;

    fn report(status: ClusterStatus) -> RunReport {
        RunReport {
            summary: ClusterSummary {
                analysis_time: Utc::now(),
                execution_duration_seconds: 1.25,
                namespace_count: 0,
                total_workloads: 0,
                total_issues: usize::from(status == ClusterStatus::Alert),
                status,
            },
            namespaces: vec![],
            failures: vec![],
            error: None,
        }
    }

    #[test]
    fn test_analyzer_metrics_record_run() {
        // Metrics live in the global Prometheus registry, so only the
        // recording path is exercised here.
        let metrics = AnalyzerMetrics::new();

        metrics.publish(&report(ClusterStatus::Alert)).unwrap();
        metrics.publish(&report(ClusterStatus::Healthy)).unwrap();

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "security_analyzer_runs_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-cluster");
        assert_eq!(logger.cluster, "test-cluster");
        assert!(logger.publish(&report(ClusterStatus::Healthy)).is_ok());
    }
}
