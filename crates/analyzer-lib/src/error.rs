//! Error types for the analysis pipeline

use std::time::Duration;
use thiserror::Error;

/// Collaborator call that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListNamespaces,
    ListWorkloads(String),
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ListNamespaces => write!(f, "list namespaces"),
            Operation::ListWorkloads(namespace) => write!(f, "list workloads in {}", namespace),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to {operation}: {message}")]
    CollaboratorUnavailable { operation: Operation, message: String },

    #[error("an analysis run is already in progress")]
    RunInProgress,

    #[error("unknown rule: {0}")]
    UnknownRule(String),
}

impl AnalysisError {
    pub fn unavailable(operation: Operation, err: &anyhow::Error) -> Self {
        Self::CollaboratorUnavailable {
            operation,
            message: format!("{:#}", err),
        }
    }

    pub fn timed_out(operation: Operation, timeout: Duration) -> Self {
        Self::CollaboratorUnavailable {
            operation,
            message: format!("timed out after {}s", timeout.as_secs_f64()),
        }
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_message() {
        let err = AnalysisError::unavailable(
            Operation::ListWorkloads("payments".to_string()),
            &anyhow::anyhow!("connection refused"),
        );
        assert_eq!(
            err.to_string(),
            "failed to list workloads in payments: connection refused"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = AnalysisError::timed_out(Operation::ListNamespaces, Duration::from_secs(30));
        assert_eq!(err.to_string(), "failed to list namespaces: timed out after 30s");
    }
}
