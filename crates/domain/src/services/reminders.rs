//! Reminder scheduling on top of a [`NotificationSurface`].
//!
//! One daily reminder per medication entry, keyed by the entry id, so
//! rescheduling an entry replaces its reminder instead of adding another.
//! Surface failures are logged and swallowed; they never fail the store
//! operation that triggered them.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use shared::clock::next_occurrence;

use super::notification::{
    NotificationRequest, NotificationSurface, Trigger, REMINDER_TITLE, WRONG_BOX_ID_PREFIX,
    WRONG_BOX_TITLE,
};
use crate::models::alert::wrong_box_message;
use crate::models::MedicationEntry;

/// Delay before a wrong-box notification fires.
pub const WRONG_BOX_DELAY_SECS: u32 = 1;

pub fn reminder_id(entry_id: Uuid) -> String {
    entry_id.to_string()
}

pub fn wrong_box_id(entry_id: Uuid) -> String {
    format!("{}{}", WRONG_BOX_ID_PREFIX, entry_id)
}

pub fn reminder_body(box_number: u8) -> String {
    format!("Time to take your medication from Box {}.", box_number)
}

#[derive(Clone)]
pub struct ReminderScheduler {
    surface: Arc<dyn NotificationSurface>,
}

impl ReminderScheduler {
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Self {
        Self { surface }
    }

    /// Registers (or replaces) the daily reminder for `entry`.
    pub async fn schedule_reminder(&self, entry: &MedicationEntry, now: NaiveDateTime) {
        let fire_at = next_occurrence(entry.time, now);
        let request = NotificationRequest {
            id: reminder_id(entry.id),
            trigger: Trigger::Calendar {
                fire_at,
                repeats_daily: true,
            },
            title: REMINDER_TITLE.to_string(),
            body: reminder_body(entry.box_number),
        };
        match self.surface.register(request).await {
            Ok(()) => info!(
                entry_id = %entry.id,
                fire_at = %fire_at,
                box_number = entry.box_number,
                "Medication reminder scheduled"
            ),
            Err(e) => warn!(
                entry_id = %entry.id,
                error = %e,
                "Failed to schedule medication reminder"
            ),
        }
    }

    /// Registers a one-shot notification telling the patient they opened the wrong box.
    pub async fn schedule_wrong_box_alert(&self, entry: &MedicationEntry, opened_box: u8) {
        let request = NotificationRequest {
            id: wrong_box_id(entry.id),
            trigger: Trigger::TimeInterval {
                seconds: WRONG_BOX_DELAY_SECS,
            },
            title: WRONG_BOX_TITLE.to_string(),
            body: wrong_box_message(opened_box, entry.box_number),
        };
        if let Err(e) = self.surface.register(request).await {
            warn!(
                entry_id = %entry.id,
                opened_box,
                error = %e,
                "Failed to schedule wrong box notification"
            );
        }
    }

    /// Cancels the reminder and any wrong-box notification for an entry.
    pub async fn cancel_reminder(&self, entry_id: Uuid) {
        let ids = [reminder_id(entry_id), wrong_box_id(entry_id)];
        if let Err(e) = self.surface.cancel(&ids).await {
            warn!(
                entry_id = %entry_id,
                error = %e,
                "Failed to cancel medication reminder"
            );
        }
    }
}
