//! One-off cluster analysis

use analyzer_lib::{
    NamespaceReport, RuleSet, RunConfig, RunCoordinator, RunReport, SecurityTier, WorkloadSource,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tabled::Tabled;

use crate::output::{
    color_percent, color_status, color_tier, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

/// Options resolved from flags and the config file
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub namespaces: Vec<String>,
    pub exclude: Vec<String>,
    pub enable_rules: Vec<String>,
    pub disable_rules: Vec<String>,
    pub timeout: Duration,
    pub details: bool,
}

/// Row for the namespace table
#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Workloads")]
    workloads: usize,
    #[tabled(rename = "Restricted")]
    restricted: usize,
    #[tabled(rename = "Baseline")]
    baseline: usize,
    #[tabled(rename = "Privileged")]
    privileged: usize,
    #[tabled(rename = "Issues")]
    issues: usize,
    #[tabled(rename = "% Restricted")]
    percent_restricted: String,
}

/// Row for the per-workload details table
#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Issues")]
    issues: String,
    #[tabled(rename = "Recommendations")]
    recommendations: String,
}

/// Run a single analysis and print the result
pub async fn analyze(
    source: Arc<dyn WorkloadSource>,
    options: &AnalyzeOptions,
    format: OutputFormat,
) -> Result<()> {
    let report = run(source, options).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report, options.details),
    }

    Ok(())
}

/// Run the coordinator once with the given options
pub async fn run(source: Arc<dyn WorkloadSource>, options: &AnalyzeOptions) -> Result<RunReport> {
    let rules = RuleSet::with_overrides(&options.enable_rules, &options.disable_rules)
        .context("Invalid rule selection")?;
    let config = RunConfig {
        call_timeout: options.timeout,
        include_namespaces: options.namespaces.clone(),
        exclude_namespaces: options.exclude.clone(),
    };

    let coordinator = RunCoordinator::new(source, rules, config);
    Ok(coordinator.run_once().await?)
}

fn print_report(report: &RunReport, details: bool) {
    if let Some(error) = &report.error {
        print_warning(&format!("Analysis aborted: {}", error));
    }
    for failure in &report.failures {
        print_warning(&format!(
            "Skipped namespace {}: {}",
            failure.namespace, failure.error
        ));
    }

    if report.namespaces.is_empty() {
        print_warning("No namespaces analyzed");
    } else {
        print_table(namespace_rows(&report.namespaces));
    }

    if details {
        for namespace in report.namespaces.iter().filter(|ns| ns.workload_count > 0) {
            println!("\n{}", namespace.namespace);
            print_table(workload_rows(namespace));
        }
    }

    let summary = &report.summary;
    println!();
    print_info(&format!(
        "Analyzed {} namespaces ({} workloads) in {:.2}s",
        summary.namespace_count, summary.total_workloads, summary.execution_duration_seconds
    ));
    print_info(&format!(
        "Total issues: {}, status: {}",
        summary.total_issues,
        color_status(summary.status)
    ));
}

fn namespace_rows(namespaces: &[NamespaceReport]) -> Vec<NamespaceRow> {
    let count = |ns: &NamespaceReport, tier: SecurityTier| {
        ns.tier_distribution.get(&tier).copied().unwrap_or(0)
    };

    namespaces
        .iter()
        .map(|ns| NamespaceRow {
            namespace: ns.namespace.clone(),
            tier: color_tier(ns.recommended_tier),
            workloads: ns.workload_count,
            restricted: count(ns, SecurityTier::Restricted),
            baseline: count(ns, SecurityTier::Baseline),
            privileged: count(ns, SecurityTier::Privileged),
            issues: ns.summary.total_issues,
            percent_restricted: color_percent(ns.summary.percent_restricted),
        })
        .collect()
}

fn workload_rows(namespace: &NamespaceReport) -> Vec<WorkloadRow> {
    namespace
        .workloads
        .iter()
        .map(|w| WorkloadRow {
            workload: w.workload.clone(),
            tier: color_tier(w.result.tier),
            issues: w.result.issues.join("\n"),
            recommendations: w.result.recommendations.join("\n"),
        })
        .collect()
}
