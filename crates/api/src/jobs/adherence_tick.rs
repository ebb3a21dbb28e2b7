//! Periodic adherence evaluation.

use std::time::Duration;

use chrono::Local;

use super::scheduler::Job;
use crate::services::tracker::Tracker;

/// Job that runs one adherence evaluation per tick.
///
/// The first run waits a full period since the session evaluates on start.
pub struct AdherenceTickJob {
    tracker: Tracker,
    interval_secs: u64,
}

impl AdherenceTickJob {
    pub fn new(tracker: Tracker, interval_secs: u64) -> Self {
        Self {
            tracker,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for AdherenceTickJob {
    fn name(&self) -> &'static str {
        "adherence_tick"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let evaluation = self.tracker.tick(Local::now().naive_local()).await;
        tracing::debug!(
            entries = evaluation.statuses.len(),
            alerts = evaluation.alerts.len(),
            "Adherence evaluated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::FirstRun;
    use domain::models::MonitorThresholds;
    use domain::services::MockNotificationSurface;
    use persistence::db::create_memory_pool;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_adherence_tick_job() {
        let tracker = Tracker::load(
            create_memory_pool().await.unwrap(),
            Arc::new(MockNotificationSurface::new()),
            MonitorThresholds::default(),
            Local::now().naive_local(),
        )
        .await;
        let job = AdherenceTickJob::new(tracker, 60);
        assert_eq!(job.name(), "adherence_tick");
        assert_eq!(job.period(), Duration::from_secs(60));
        assert_eq!(job.first_run(), FirstRun::AfterPeriod);
        assert!(job.execute().await.is_ok());
    }
}
