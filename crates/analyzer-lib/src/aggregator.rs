//! Namespace aggregation
//!
//! Evaluates every workload of a namespace and rolls the results up into a
//! [`NamespaceReport`].

use crate::error::{AnalysisError, Operation, Result};
use crate::models::{
    NamespaceReport, NamespaceSummary, SecurityTier, WorkloadResult, WorkloadSpec,
};
use crate::rules::RuleSet;
use crate::source::WorkloadSource;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Default bound on a single collaborator call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds namespace reports from a workload source
pub struct NamespaceAggregator<'a> {
    source: &'a dyn WorkloadSource,
    rules: &'a RuleSet,
    call_timeout: Duration,
}

impl<'a> NamespaceAggregator<'a> {
    pub fn new(source: &'a dyn WorkloadSource, rules: &'a RuleSet) -> Self {
        Self {
            source,
            rules,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// List and evaluate the workloads of `namespace`
    pub async fn analyze(&self, namespace: &str) -> Result<NamespaceReport> {
        let operation = Operation::ListWorkloads(namespace.to_string());
        let workloads =
            match tokio::time::timeout(self.call_timeout, self.source.list_workloads(namespace))
                .await
            {
                Ok(Ok(workloads)) => workloads,
                Ok(Err(e)) => return Err(AnalysisError::unavailable(operation, &e)),
                Err(_) => return Err(AnalysisError::timed_out(operation, self.call_timeout)),
            };

        debug!(
            namespace = %namespace,
            workloads = workloads.len(),
            "Evaluating namespace"
        );

        Ok(build_report(namespace, &workloads, self.rules, Utc::now()))
    }
}

/// Evaluate `workloads` in listing order and summarize them
pub fn build_report(
    namespace: &str,
    workloads: &[WorkloadSpec],
    rules: &RuleSet,
    timestamp: DateTime<Utc>,
) -> NamespaceReport {
    let results: Vec<WorkloadResult> = workloads
        .iter()
        .map(|workload| WorkloadResult {
            workload: workload.name.clone(),
            result: rules.evaluate_workload(workload),
        })
        .collect();

    let mut tier_distribution: BTreeMap<SecurityTier, usize> =
        SecurityTier::ALL.iter().map(|tier| (*tier, 0)).collect();
    for entry in &results {
        *tier_distribution.entry(entry.result.tier).or_default() += 1;
    }

    let recommended_tier = results
        .iter()
        .map(|entry| entry.result.tier)
        .max()
        .unwrap_or_default();

    let workload_count = results.len();
    let restricted = tier_distribution
        .get(&SecurityTier::Restricted)
        .copied()
        .unwrap_or(0);

    let summary = NamespaceSummary {
        total_issues: results.iter().map(|e| e.result.issues.len()).sum(),
        total_recommendations: results.iter().map(|e| e.result.recommendations.len()).sum(),
        percent_restricted: percent(restricted, workload_count),
    };

    NamespaceReport {
        namespace: namespace.to_string(),
        timestamp,
        recommended_tier,
        workload_count,
        tier_distribution,
        workloads: results,
        summary,
    }
}

/// Percentage rounded to two decimals, zero for an empty population
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let value = 100.0 * part as f64 / total as f64;
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerSecurityContext, ContainerSpec, PodSecurityContext};
    use crate::source::{async_trait, SnapshotSource};

    fn workload(name: &str, tier: SecurityTier) -> WorkloadSpec {
        let mut container = ContainerSpec {
            name: name.to_string(),
            security_context: Some(ContainerSecurityContext {
                run_as_non_root: Some(true),
                read_only_root_filesystem: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        if tier == SecurityTier::Baseline {
            if let Some(ctx) = container.security_context.as_mut() {
                ctx.capabilities_added.insert("NET_BIND_SERVICE".to_string());
            }
        }

        WorkloadSpec {
            name: name.to_string(),
            security_context: Some(PodSecurityContext {
                run_as_non_root: Some(true),
                privileged: None,
            }),
            host_network: tier == SecurityTier::Privileged,
            containers: vec![container],
            ..Default::default()
        }
    }

    #[test]
    fn test_mixed_namespace_report() {
        let workloads = vec![
            workload("frontend", SecurityTier::Restricted),
            workload("proxy", SecurityTier::Baseline),
            workload("agent", SecurityTier::Privileged),
        ];

        let report = build_report("shop", &workloads, &RuleSet::default(), Utc::now());

        assert_eq!(report.recommended_tier, SecurityTier::Privileged);
        assert_eq!(report.workload_count, 3);
        assert_eq!(report.tier_distribution[&SecurityTier::Restricted], 1);
        assert_eq!(report.tier_distribution[&SecurityTier::Baseline], 1);
        assert_eq!(report.tier_distribution[&SecurityTier::Privileged], 1);
        assert_eq!(report.summary.percent_restricted, 33.33);
        assert_eq!(report.summary.total_issues, 2);
        assert_eq!(report.summary.total_recommendations, 0);

        let names: Vec<_> = report.workloads.iter().map(|w| w.workload.as_str()).collect();
        assert_eq!(names, vec!["frontend", "proxy", "agent"]);
    }

    #[test]
    fn test_empty_namespace_report() {
        let report = build_report("empty", &[], &RuleSet::default(), Utc::now());

        assert_eq!(report.recommended_tier, SecurityTier::Restricted);
        assert_eq!(report.workload_count, 0);
        assert_eq!(report.summary.percent_restricted, 0.0);
        assert_eq!(report.tier_distribution.values().sum::<usize>(), 0);
        assert_eq!(report.tier_distribution.len(), 3);
    }

    #[test]
    fn test_distribution_sums_to_workload_count() {
        let workloads: Vec<_> = (0..7)
            .map(|i| {
                let tier = SecurityTier::ALL[i % 3];
                workload(&format!("w{}", i), tier)
            })
            .collect();

        let report = build_report("ns", &workloads, &RuleSet::default(), Utc::now());
        assert_eq!(
            report.tier_distribution.values().sum::<usize>(),
            report.workload_count
        );
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(2, 3), 66.67);
        assert_eq!(percent(4, 4), 100.0);
    }

    #[tokio::test]
    async fn test_analyze_from_source() {
        let source = SnapshotSource::new()
            .with_namespace("shop", vec![workload("frontend", SecurityTier::Restricted)]);
        let rules = RuleSet::default();

        let report = NamespaceAggregator::new(&source, &rules)
            .analyze("shop")
            .await
            .unwrap();

        assert_eq!(report.namespace, "shop");
        assert_eq!(report.summary.percent_restricted, 100.0);
    }

    #[tokio::test]
    async fn test_analyze_listing_failure() {
        let source = SnapshotSource::new();
        let rules = RuleSet::default();

        let err = NamespaceAggregator::new(&source, &rules)
            .analyze("missing")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::CollaboratorUnavailable {
                operation: Operation::ListWorkloads(ref ns),
                ..
            } if ns == "missing"
        ));
    }

    struct SlowSource;

    #[async_trait]
    impl WorkloadSource for SlowSource {
        async fn list_namespaces(&self) -> anyhow::Result<Vec<String>> {
            Ok(vec!["slow".to_string()])
        }

        async fn list_workloads(&self, _namespace: &str) -> anyhow::Result<Vec<WorkloadSpec>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_times_out() {
        let rules = RuleSet::default();

        let err = NamespaceAggregator::new(&SlowSource, &rules)
            .with_call_timeout(Duration::from_secs(5))
            .analyze("slow")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to list workloads in slow: timed out after 5s"
        );
    }
}
