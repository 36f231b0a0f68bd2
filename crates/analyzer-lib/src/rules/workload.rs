//! Workload-level rules
//!
//! Pod-level fields, host namespaces, per-container escalation and hardening,
//! and volumes. Every rule runs; the resulting tier is the maximum over all
//! findings.

use super::{Finding, RuleSet};
use crate::models::{SecurityTier, WorkloadSpec};

/// A single named workload check
#[derive(Debug, Clone, Copy)]
pub struct WorkloadRule {
    pub name: &'static str,
    pub description: &'static str,
    /// Highest tier this rule can raise a workload to
    pub tier: SecurityTier,
    pub enabled_by_default: bool,
    pub check: fn(&WorkloadSpec, &RuleSet) -> Vec<Finding>,
}

/// Workload rules in evaluation order
pub const WORKLOAD_RULES: &[WorkloadRule] = &[
    WorkloadRule {
        name: "pod-security-context",
        description: "pod-level security context present and not running as root",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: pod_security_context,
    },
    WorkloadRule {
        name: "host-network",
        description: "pod shares the host network namespace",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: host_network,
    },
    WorkloadRule {
        name: "host-pid",
        description: "pod shares the host PID namespace",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: host_pid,
    },
    WorkloadRule {
        name: "host-ipc",
        description: "pod shares the host IPC namespace",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: host_ipc,
    },
    WorkloadRule {
        name: "container-escalation",
        description: "containers adding capabilities or binding host ports",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: container_escalation,
    },
    WorkloadRule {
        name: "container-hardening",
        description: "per-container hardening checks",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: container_hardening,
    },
    WorkloadRule {
        name: "host-path-volume",
        description: "hostPath volumes expose the node filesystem",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: host_path_volumes,
    },
    WorkloadRule {
        name: "cloud-provider-volume",
        description: "in-tree cloud provider volumes",
        tier: SecurityTier::Baseline,
        enabled_by_default: true,
        check: cloud_provider_volumes,
    },
];

fn pod_security_context(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    match &workload.security_context {
        None => vec![Finding::recommendation("add pod-level security context")],
        Some(ctx) if ctx.run_as_non_root == Some(false) => {
            vec![Finding::issue(SecurityTier::Privileged, "pod may run as root")]
        }
        Some(_) => Vec::new(),
    }
}

fn host_network(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    flag(workload.host_network, "pod uses host network")
}

fn host_pid(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    flag(workload.host_pid, "pod uses host PID namespace")
}

fn host_ipc(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    flag(workload.host_ipc, "pod uses host IPC namespace")
}

fn flag(set: bool, message: &str) -> Vec<Finding> {
    if set {
        vec![Finding::issue(SecurityTier::Privileged, message)]
    } else {
        Vec::new()
    }
}

fn container_escalation(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    let mut findings = Vec::new();

    for container in &workload.containers {
        if let Some(caps) = container.capabilities_added() {
            let caps: Vec<&str> = caps.iter().map(String::as_str).collect();
            findings.push(Finding::issue(
                SecurityTier::Baseline,
                format!("container {}: adds capabilities {}", container.name, caps.join(", ")),
            ));
        }

        if !container.host_ports.is_empty() {
            let ports: Vec<String> = container.host_ports.iter().map(u16::to_string).collect();
            findings.push(Finding::issue(
                SecurityTier::Privileged,
                format!("container {}: binds host ports {}", container.name, ports.join(", ")),
            ));
        }
    }

    findings
}

fn container_hardening(workload: &WorkloadSpec, rules: &RuleSet) -> Vec<Finding> {
    workload
        .containers
        .iter()
        .flat_map(|container| {
            rules.container_rules(container).map(move |rule| {
                Finding::issue(rule.tier, format!("container {}: {}", container.name, rule.issue))
            })
        })
        .collect()
}

fn host_path_volumes(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    workload
        .volumes
        .iter()
        .filter_map(|volume| volume.host_path.as_deref())
        .map(|path| {
            Finding::issue(
                SecurityTier::Privileged,
                format!("uses hostPath volume: {}", path),
            )
        })
        .collect()
}

fn cloud_provider_volumes(workload: &WorkloadSpec, _: &RuleSet) -> Vec<Finding> {
    if workload
        .volumes
        .iter()
        .any(|volume| volume.cloud_provider_volume_type.is_some())
    {
        vec![Finding::Escalation(SecurityTier::Baseline)]
    } else {
        Vec::new()
    }
}
