//! Container-level hardening rules
//!
//! Each rule inspects one container in isolation and yields a fixed issue
//! string. Rules never short-circuit each other; the caller decides what
//! tier the fired rules imply.

use crate::models::{ContainerSpec, SecurityTier};

/// A single named container check
#[derive(Debug, Clone, Copy)]
pub struct ContainerRule {
    pub name: &'static str,
    pub issue: &'static str,
    /// Tier the owning workload is raised to when this rule fires
    pub tier: SecurityTier,
    pub enabled_by_default: bool,
    pub check: fn(&ContainerSpec) -> bool,
}

/// Container rules in evaluation order
pub const CONTAINER_RULES: &[ContainerRule] = &[
    ContainerRule {
        name: "container-security-context",
        issue: "no security context defined",
        tier: SecurityTier::Restricted,
        enabled_by_default: true,
        check: missing_security_context,
    },
    ContainerRule {
        name: "container-run-as-root",
        issue: "container may run as root",
        tier: SecurityTier::Restricted,
        enabled_by_default: true,
        check: may_run_as_root,
    },
    ContainerRule {
        name: "container-privileged",
        issue: "container runs in privileged mode",
        tier: SecurityTier::Privileged,
        enabled_by_default: true,
        check: runs_privileged,
    },
    ContainerRule {
        name: "container-writable-root-fs",
        issue: "root filesystem is writable",
        tier: SecurityTier::Restricted,
        enabled_by_default: true,
        check: writable_root_filesystem,
    },
    ContainerRule {
        name: "container-resource-limits",
        issue: "no resource limits defined",
        tier: SecurityTier::Restricted,
        enabled_by_default: false,
        check: missing_resource_limits,
    },
    ContainerRule {
        name: "container-mutable-image-tag",
        issue: "image uses a mutable tag",
        tier: SecurityTier::Restricted,
        enabled_by_default: false,
        check: uses_mutable_image_tag,
    },
];

fn missing_security_context(container: &ContainerSpec) -> bool {
    container.security_context.is_none()
}

// Only an explicit `runAsNonRoot: false` is flagged.
fn may_run_as_root(container: &ContainerSpec) -> bool {
    container
        .security_context
        .as_ref()
        .map(|ctx| ctx.run_as_non_root == Some(false))
        .unwrap_or(false)
}

fn runs_privileged(container: &ContainerSpec) -> bool {
    container.is_privileged()
}

fn writable_root_filesystem(container: &ContainerSpec) -> bool {
    container
        .security_context
        .as_ref()
        .and_then(|ctx| ctx.read_only_root_filesystem)
        != Some(true)
}

fn missing_resource_limits(container: &ContainerSpec) -> bool {
    !container.has_resource_limits
}

fn uses_mutable_image_tag(container: &ContainerSpec) -> bool {
    container
        .image
        .as_deref()
        .map(is_mutable_reference)
        .unwrap_or(false)
}

/// True for untagged references and `:latest`; digests are immutable
pub fn is_mutable_reference(image: &str) -> bool {
    if image.contains('@') {
        return false;
    }

    // The registry host may carry a port, so only the last path segment holds the tag
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    match last_segment.split_once(':') {
        Some((_, tag)) => tag.is_empty() || tag == "latest",
        None => true,
    }
}
