//! Pending notification store and delivery.
//!
//! The center is the service-side [`NotificationSurface`]: reminders and
//! wrong-box alerts are registered here and delivered through a
//! [`NotificationSink`] once due. Daily triggers are re-armed for the next
//! day after each delivery; one-shot triggers are dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use domain::services::{NotificationError, NotificationRequest, NotificationSurface, Trigger};
use metrics::counter;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::NotificationsConfig;

/// Source of the local wall-clock time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// Final destination of a due notification.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotificationError>;
}

/// Console sink - logs notifications (for development).
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink;

#[async_trait::async_trait]
impl NotificationSink for ConsoleSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        info!(
            notification_id = %request.id,
            title = %request.title,
            body = %request.body,
            "Notification (console provider)"
        );
        Ok(())
    }
}

/// Payload posted by [`WebhookSink`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub delivered_at: NaiveDateTime,
}

/// Webhook sink - posts each notification as JSON.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        let payload = WebhookNotification {
            id: &request.id,
            title: &request.title,
            body: &request.body,
            delivered_at: Local::now().naive_local(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(notification_id = %request.id, status = %status, "Webhook delivered");
            Ok(())
        } else {
            Err(NotificationError::Delivery(format!(
                "Webhook responded with {}",
                status
            )))
        }
    }
}

/// Builds the sink selected by the notifications config.
pub fn sink_from_config(
    config: &NotificationsConfig,
) -> Result<Arc<dyn NotificationSink>, reqwest::Error> {
    match config.provider.as_str() {
        "webhook" => {
            let sink = WebhookSink::new(
                config.webhook_url.clone(),
                Duration::from_millis(config.request_timeout_ms),
            )?;
            info!(url = %config.webhook_url, "Using webhook notification provider");
            Ok(Arc::new(sink))
        }
        provider => {
            if provider != "console" {
                warn!(provider = %provider, "Unknown notification provider, using console");
            }
            Ok(Arc::new(ConsoleSink))
        }
    }
}

/// A registered notification and the local time it is next due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingNotification {
    #[serde(flatten)]
    pub request: NotificationRequest,
    pub due_at: NaiveDateTime,
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

pub struct NotificationCenter {
    pending: Mutex<HashMap<String, PendingNotification>>,
    sink: Arc<dyn NotificationSink>,
    clock: Clock,
}

impl NotificationCenter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_clock(sink, local_clock())
    }

    pub fn with_clock(sink: Arc<dyn NotificationSink>, clock: Clock) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            sink,
            clock,
        }
    }

    /// Pending notifications ordered by due time, then id.
    pub async fn pending(&self) -> Vec<PendingNotification> {
        let mut pending: Vec<_> = self.pending.lock().await.values().cloned().collect();
        pending.sort_by(|a, b| {
            a.due_at
                .cmp(&b.due_at)
                .then_with(|| a.request.id.cmp(&b.request.id))
        });
        pending
    }

    /// Delivers every notification due at or before `now`.
    pub async fn dispatch_due(&self, now: NaiveDateTime) -> DispatchSummary {
        let due: Vec<NotificationRequest> = {
            let mut pending = self.pending.lock().await;
            let ids: Vec<String> = pending
                .values()
                .filter(|p| p.due_at <= now)
                .map(|p| p.request.id.clone())
                .collect();

            let mut due = Vec::with_capacity(ids.len());
            for id in ids {
                let Some(mut entry) = pending.remove(&id) else {
                    continue;
                };
                if entry.request.repeats() {
                    // Skip occurrences missed while the service was down.
                    while entry.due_at <= now {
                        entry.due_at += ChronoDuration::days(1);
                    }
                    due.push(entry.request.clone());
                    pending.insert(id, entry);
                } else {
                    due.push(entry.request);
                }
            }
            due
        };

        let mut summary = DispatchSummary::default();
        for request in due {
            match self.sink.deliver(&request).await {
                Ok(()) => {
                    summary.delivered += 1;
                    counter!("notifications_dispatched_total", "result" => "delivered")
                        .increment(1);
                }
                Err(e) => {
                    summary.failed += 1;
                    counter!("notifications_dispatched_total", "result" => "failed").increment(1);
                    warn!(notification_id = %request.id, error = %e, "Notification delivery failed");
                }
            }
        }
        summary
    }

    /// Dispatch pass at the current local time.
    pub async fn dispatch_now(&self) -> DispatchSummary {
        self.dispatch_due((self.clock)()).await
    }
}

#[async_trait::async_trait]
impl NotificationSurface for NotificationCenter {
    async fn register(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        let due_at = match request.trigger {
            Trigger::Calendar { fire_at, .. } => fire_at,
            Trigger::TimeInterval { seconds } => {
                (self.clock)() + ChronoDuration::seconds(i64::from(seconds))
            }
        };
        debug!(notification_id = %request.id, due_at = %due_at, "Notification registered");
        self.pending.lock().await.insert(
            request.id.clone(),
            PendingNotification { request, due_at },
        );
        Ok(())
    }

    async fn cancel(&self, ids: &[String]) -> Result<(), NotificationError> {
        let mut pending = self.pending.lock().await;
        for id in ids {
            if pending.remove(id).is_some() {
                debug!(notification_id = %id, "Notification cancelled");
            }
        }
        Ok(())
    }
}
