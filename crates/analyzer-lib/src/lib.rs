//! Pod Security Standards analysis library
//!
//! This crate provides the core functionality for:
//! - Classifying workloads into restricted / baseline / privileged tiers
//! - Aggregating workload findings per namespace and cluster
//! - Reading workloads from Kubernetes or offline snapshots
//! - Reporting, health checks and observability

pub mod aggregator;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod report;
pub mod rules;
pub mod source;

pub use aggregator::NamespaceAggregator;
pub use coordinator::{RunConfig, RunCoordinator};
pub use error::{AnalysisError, Operation};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{AnalyzerMetrics, StructuredLogger};
pub use report::{JsonFileSink, ReportSink};
pub use rules::RuleSet;
pub use source::{KubeWorkloadSource, SnapshotSource, WorkloadSource};
