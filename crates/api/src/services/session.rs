//! Monitoring session lifecycle.
//!
//! A session couples beacon scanning with the periodic adherence evaluation:
//! starting it does both, stopping it undoes both. Start and stop are
//! idempotent.

use std::time::Duration;

use chrono::Local;
use domain::models::RadioStatus;
use domain::DomainError;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::tracker::Tracker;
use crate::jobs::{AdherenceTickJob, JobScheduler};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Session state as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStatusResponse {
    pub active: bool,
    pub radio: RadioStatus,
    pub scan_requested: bool,
}

pub struct MonitoringSession {
    tracker: Tracker,
    interval_secs: u64,
    scheduler: Mutex<Option<JobScheduler>>,
}

impl MonitoringSession {
    pub fn new(tracker: Tracker, interval_secs: u64) -> Self {
        Self {
            tracker,
            interval_secs,
            scheduler: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> MonitoringStatusResponse {
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_none() {
            match self.tracker.start_scanning().await {
                Ok(()) => {}
                Err(DomainError::RadioUnavailable) => {
                    warn!("Monitoring started without radio; scanning resumes when it powers on")
                }
                Err(e) => warn!(error = %e, "Failed to start scanning"),
            }

            self.tracker.tick(Local::now().naive_local()).await;

            let mut jobs = JobScheduler::new();
            jobs.register(AdherenceTickJob::new(
                self.tracker.clone(),
                self.interval_secs,
            ));
            jobs.start();
            *scheduler = Some(jobs);
            info!(interval_secs = self.interval_secs, "Monitoring session started");
        }
        self.status_with(scheduler.is_some()).await
    }

    pub async fn stop(&self) -> MonitoringStatusResponse {
        let mut scheduler = self.scheduler.lock().await;
        if let Some(jobs) = scheduler.take() {
            self.tracker.stop_scanning().await;
            jobs.shutdown();
            jobs.wait_for_shutdown(SHUTDOWN_TIMEOUT).await;
            info!("Monitoring session stopped");
        }
        self.status_with(false).await
    }

    pub async fn is_active(&self) -> bool {
        self.scheduler.lock().await.is_some()
    }

    pub async fn status(&self) -> MonitoringStatusResponse {
        let active = self.is_active().await;
        self.status_with(active).await
    }

    async fn status_with(&self, active: bool) -> MonitoringStatusResponse {
        let radio = self.tracker.radio_status().await;
        MonitoringStatusResponse {
            active,
            radio: radio.radio,
            scan_requested: radio.scan_requested,
        }
    }
}
