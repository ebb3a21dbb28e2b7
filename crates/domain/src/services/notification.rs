//! Local notification abstractions.
//!
//! Reminders are handed to a notification surface that owns delivery. The
//! surface keys requests by id: registering an id that is already pending
//! replaces the earlier request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title of daily medication reminders.
pub const REMINDER_TITLE: &str = "Medication Reminder";

/// Title of wrong-box notifications.
pub const WRONG_BOX_TITLE: &str = "Wrong Box Alert";

/// Prefix of wrong-box notification ids; the entry id follows.
pub const WRONG_BOX_ID_PREFIX: &str = "wrongBox-";

/// When a notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// At a local wall-clock time, optionally every day at that time.
    Calendar {
        fire_at: NaiveDateTime,
        repeats_daily: bool,
    },
    /// Once, a number of seconds after registration.
    TimeInterval { seconds: u32 },
}

/// A notification registered with a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub id: String,
    pub trigger: Trigger,
    pub title: String,
    pub body: String,
}

impl NotificationRequest {
    pub fn repeats(&self) -> bool {
        matches!(
            self.trigger,
            Trigger::Calendar {
                repeats_daily: true,
                ..
            }
        )
    }
}

/// Notification surface failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification surface rejected request {id}: {reason}")]
    Rejected { id: String, reason: String },

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Destination for scheduled local notifications.
#[async_trait::async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Registers a request, replacing any pending request with the same id.
    async fn register(&self, request: NotificationRequest) -> Result<(), NotificationError>;

    /// Removes pending requests. Unknown ids are ignored.
    async fn cancel(&self, ids: &[String]) -> Result<(), NotificationError>;
}

/// In-memory surface for development and testing.
///
/// Keeps the pending set so tests can inspect it.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationSurface {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    pending: Arc<Mutex<HashMap<String, NotificationRequest>>>,
}

impl MockNotificationSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock surface that rejects every call.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Pending requests, sorted by id.
    pub fn pending(&self) -> Vec<NotificationRequest> {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let mut requests: Vec<_> = pending.values().cloned().collect();
        requests.sort_by(|a, b| a.id.cmp(&b.id));
        requests
    }

    pub fn get(&self, id: &str) -> Option<NotificationRequest> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl NotificationSurface for MockNotificationSurface {
    async fn register(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        if self.simulate_failure {
            tracing::warn!(
                notification_id = %request.id,
                "Mock notification surface simulating failure"
            );
            return Err(NotificationError::Rejected {
                id: request.id,
                reason: "Simulated failure".to_string(),
            });
        }

        tracing::info!(
            notification_id = %request.id,
            title = %request.title,
            "Mock: Would schedule notification"
        );
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request.id.clone(), request);
        Ok(())
    }

    async fn cancel(&self, ids: &[String]) -> Result<(), NotificationError> {
        if self.simulate_failure {
            return Err(NotificationError::Delivery("Simulated failure".to_string()));
        }
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        for id in ids {
            pending.remove(id);
        }
        Ok(())
    }
}
