//! Security tier classification rules
//!
//! This module provides:
//! - Container rules producing hardening issues for a single container
//! - Workload rules folding pod, container and volume findings into a tier
//! - A rule set that toggles individual rules by name

mod container;
mod workload;


pub use container::{is_mutable_reference, ContainerRule, CONTAINER_RULES};
pub use workload::{WorkloadRule, WORKLOAD_RULES};

use crate::error::{AnalysisError, Result};
use crate::models::{ContainerSpec, EvaluationResult, SecurityTier, WorkloadSpec};
use serde::Serialize;
use std::collections::BTreeSet;

/// Outcome of a single fired rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Reported issue that raises the tier to at least `tier`
    Issue { tier: SecurityTier, message: String },
    /// Advice that never affects the tier
    Recommendation(String),
    /// Tier escalation without a reported issue
    Escalation(SecurityTier),
}

impl Finding {
    pub fn issue(tier: SecurityTier, message: impl Into<String>) -> Self {
        Finding::Issue {
            tier,
            message: message.into(),
        }
    }

    pub fn recommendation(message: impl Into<String>) -> Self {
        Finding::Recommendation(message.into())
    }

    pub fn tier(&self) -> SecurityTier {
        match self {
            Finding::Issue { tier, .. } | Finding::Escalation(tier) => *tier,
            Finding::Recommendation(_) => SecurityTier::Restricted,
        }
    }
}

impl EvaluationResult {
    fn apply(mut self, finding: Finding) -> Self {
        self.tier = self.tier.max(finding.tier());
        match finding {
            Finding::Issue { message, .. } => self.issues.push(message),
            Finding::Recommendation(message) => self.recommendations.push(message),
            Finding::Escalation(_) => {}
        }
        self
    }
}

/// Which scope a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Container,
    Workload,
}

/// Catalog entry describing a rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub name: &'static str,
    pub scope: RuleScope,
    pub description: &'static str,
    pub tier: SecurityTier,
    pub enabled_by_default: bool,
}

/// The set of enabled rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    enabled: BTreeSet<&'static str>,
}

impl Default for RuleSet {
    fn default() -> Self {
        let enabled = CONTAINER_RULES
            .iter()
            .filter(|r| r.enabled_by_default)
            .map(|r| r.name)
            .chain(
                WORKLOAD_RULES
                    .iter()
                    .filter(|r| r.enabled_by_default)
                    .map(|r| r.name),
            )
            .collect();

        Self { enabled }
    }
}

impl RuleSet {
    /// Start from the defaults, enable then disable the named rules
    pub fn with_overrides<S: AsRef<str>>(enable: &[S], disable: &[S]) -> Result<Self> {
        let mut rules = Self::default();

        for name in enable {
            let name = Self::lookup(name.as_ref())?;
            rules.enabled.insert(name);
        }
        for name in disable {
            let name = Self::lookup(name.as_ref())?;
            rules.enabled.remove(name);
        }

        Ok(rules)
    }

    fn lookup(name: &str) -> Result<&'static str> {
        Self::catalog()
            .into_iter()
            .map(|info| info.name)
            .find(|known| *known == name)
            .ok_or_else(|| AnalysisError::UnknownRule(name.to_string()))
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Every known rule, container rules first
    pub fn catalog() -> Vec<RuleInfo> {
        let containers = CONTAINER_RULES.iter().map(|r| RuleInfo {
            name: r.name,
            scope: RuleScope::Container,
            description: r.issue,
            tier: r.tier,
            enabled_by_default: r.enabled_by_default,
        });
        let workloads = WORKLOAD_RULES.iter().map(|r| RuleInfo {
            name: r.name,
            scope: RuleScope::Workload,
            description: r.description,
            tier: r.tier,
            enabled_by_default: r.enabled_by_default,
        });

        containers.chain(workloads).collect()
    }

    /// Enabled container rules that fire for `container`
    pub fn container_rules<'a>(
        &'a self,
        container: &'a ContainerSpec,
    ) -> impl Iterator<Item = &'static ContainerRule> + 'a {
        CONTAINER_RULES
            .iter()
            .filter(move |rule| self.is_enabled(rule.name) && (rule.check)(container))
    }

    /// Issues found in a single container, in rule order
    pub fn evaluate_container(&self, container: &ContainerSpec) -> Vec<String> {
        self.container_rules(container)
            .map(|rule| rule.issue.to_string())
            .collect()
    }

    /// Classify a workload; the tier is the maximum over every finding
    pub fn evaluate_workload(&self, workload: &WorkloadSpec) -> EvaluationResult {
        WORKLOAD_RULES
            .iter()
            .filter(|rule| self.is_enabled(rule.name))
            .flat_map(|rule| (rule.check)(workload, self))
            .fold(EvaluationResult::default(), EvaluationResult::apply)
    }
}
