//! Delivery of due notifications.

use std::sync::Arc;
use std::time::Duration;

use super::scheduler::{FirstRun, Job};
use crate::services::notification_center::NotificationCenter;

/// Job that hands due notifications to the configured sink.
/// Runs once at start, then every period.
pub struct NotificationDispatchJob {
    center: Arc<NotificationCenter>,
    interval_secs: u64,
}

impl NotificationDispatchJob {
    pub fn new(center: Arc<NotificationCenter>, interval_secs: u64) -> Self {
        Self {
            center,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for NotificationDispatchJob {
    fn name(&self) -> &'static str {
        "notification_dispatch"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn first_run(&self) -> FirstRun {
        FirstRun::Immediately
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let summary = self.center.dispatch_now().await;
        if summary.failed > 0 {
            anyhow::bail!(
                "{} of {} notifications failed",
                summary.failed,
                summary.failed + summary.delivered
            );
        }
        Ok(())
    }
}
