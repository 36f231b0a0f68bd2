//! Security Analyzer - Pod Security Standards posture analysis
//!
//! This binary runs in-cluster, periodically classifying every Deployment
//! against the Pod Security Standards and reporting per-namespace results.

use analyzer_lib::{
    health::{Component, HealthRegistry},
    observability::{AnalyzerMetrics, StructuredLogger},
    JsonFileSink, KubeWorkloadSource, RunCoordinator,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod scheduler;

const ANALYZER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting security-analyzer");

    // Load configuration
    let config = config::AnalyzerConfig::load()?;
    info!(cluster_name = %config.cluster_name, "Analyzer configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(Component::WorkloadSource).await;
    health_registry.register(Component::Coordinator).await;
    if config.report_path.is_some() {
        health_registry.register(Component::ReportSink).await;
    }

    let metrics = AnalyzerMetrics::new();
    let logger = StructuredLogger::new(&config.cluster_name);
    logger.log_startup(ANALYZER_VERSION, config.analysis_interval_secs);

    let source = KubeWorkloadSource::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let coordinator = Arc::new(
        RunCoordinator::new(Arc::new(source), config.rule_set()?, config.run_config())
            .with_sink(Arc::new(logger.clone()))
            .with_sink(Arc::new(metrics)),
    );

    let app_state = Arc::new(api::AppState::new(health_registry.clone()));

    let mut scheduler = scheduler::Scheduler::new(
        coordinator,
        app_state.clone(),
        config.analysis_interval(),
    )
    .with_run_on_start(config.run_on_start);
    if let Some(path) = &config.report_path {
        scheduler = scheduler.with_report_file(JsonFileSink::new(path));
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    // Start health and metrics server
    let api_port = config.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            warn!(error = %e, "API server stopped");
        }
    });

    // Mark analyzer as ready after initialization
    health_registry.set_ready(true).await;

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    if let Err(e) = scheduler_handle.await {
        warn!(error = %e, "Scheduler task failed");
    }
    info!("Shutting down");

    Ok(())
}
