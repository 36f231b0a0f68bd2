//! Periodic analysis runs

use crate::api::AppState;
use analyzer_lib::health::Component;
use analyzer_lib::{AnalysisError, JsonFileSink, ReportSink, RunCoordinator, RunReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Drives [`RunCoordinator::run_once`] on a fixed interval until shutdown
pub struct Scheduler {
    coordinator: Arc<RunCoordinator>,
    state: Arc<AppState>,
    report_file: Option<JsonFileSink>,
    interval: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(coordinator: Arc<RunCoordinator>, state: Arc<AppState>, interval: Duration) -> Self {
        Self {
            coordinator,
            state,
            report_file: None,
            interval,
            run_on_start: true,
        }
    }

    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    /// Also write every report to a JSON file
    pub fn with_report_file(mut self, sink: JsonFileSink) -> Self {
        self.report_file = Some(sink);
        self
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let start = if self.run_on_start {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.recv() => {
                    info!("Scheduler stopping");
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        let health = &self.state.health_registry;

        match self.coordinator.run_once().await {
            Ok(report) => {
                health.record_run(&report).await;
                health.set_healthy(Component::Coordinator).await;
                self.write_report_file(&report).await;
                self.state.set_last_report(report).await;
            }
            Err(AnalysisError::RunInProgress) => {
                warn!("Previous analysis run still in progress, skipping");
                health
                    .set_degraded(Component::Coordinator, "previous run still in progress")
                    .await;
            }
            Err(e) => {
                warn!(error = %e, "Analysis run failed");
                health
                    .set_unhealthy(Component::Coordinator, e.to_string())
                    .await;
            }
        }
    }

    async fn write_report_file(&self, report: &RunReport) {
        let Some(sink) = &self.report_file else {
            return;
        };
        let health = &self.state.health_registry;

        match sink.publish(report) {
            Ok(()) => health.set_healthy(Component::ReportSink).await,
            Err(e) => {
                warn!(path = %sink.path().display(), error = %e, "Failed to write run report");
                health
                    .set_degraded(Component::ReportSink, format!("{:#}", e))
                    .await;
            }
        }
    }
}
