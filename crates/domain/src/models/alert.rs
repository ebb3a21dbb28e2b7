//! In-app alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medication::MedicationEntry;

/// What triggered an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Scheduled time reached, box still closed.
    DueSoon,
    /// Due window elapsed, box still closed.
    Overdue,
    /// A different mapped box was opened while a dose is outstanding.
    WrongBox,
}

impl AlertKind {
    /// Informational alerts are shown in yellow, urgent ones in red.
    pub fn is_urgent(&self) -> bool {
        !matches!(self, AlertKind::DueSoon)
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::DueSoon => write!(f, "due_soon"),
            AlertKind::Overdue => write!(f, "overdue"),
            AlertKind::WrongBox => write!(f, "wrong_box"),
        }
    }
}

pub fn due_soon_message(box_number: u8) -> String {
    format!(
        "Time for medication! Please take it from Box {}.",
        box_number
    )
}

pub fn overdue_message(box_number: u8) -> String {
    format!("You are late! Please take it from Box {}.", box_number)
}

pub fn wrong_box_message(opened_box: u8, box_number: u8) -> String {
    format!(
        "You opened Box {}, but your medication is in Box {}.",
        opened_box, box_number
    )
}

/// A user-facing alert. At most one is outstanding at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub message: String,
    pub entry_id: Uuid,
    pub box_number: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_box: Option<u8>,
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    fn build(
        kind: AlertKind,
        message: String,
        entry: &MedicationEntry,
        opened_box: Option<u8>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message,
            entry_id: entry.id,
            box_number: entry.box_number,
            opened_box,
            raised_at,
        }
    }

    pub fn due_soon(entry: &MedicationEntry, raised_at: DateTime<Utc>) -> Self {
        Self::build(
            AlertKind::DueSoon,
            due_soon_message(entry.box_number),
            entry,
            None,
            raised_at,
        )
    }

    pub fn overdue(entry: &MedicationEntry, raised_at: DateTime<Utc>) -> Self {
        Self::build(
            AlertKind::Overdue,
            overdue_message(entry.box_number),
            entry,
            None,
            raised_at,
        )
    }

    pub fn wrong_box(entry: &MedicationEntry, opened_box: u8, raised_at: DateTime<Utc>) -> Self {
        Self::build(
            AlertKind::WrongBox,
            wrong_box_message(opened_box, entry.box_number),
            entry,
            Some(opened_box),
            raised_at,
        )
    }
}

/// Single-slot alert holder: a new alert replaces an unacknowledged one.
#[derive(Debug, Clone, Default)]
pub struct AlertSlot {
    current: Option<Alert>,
}

impl AlertSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `alert`, returning the unacknowledged alert it replaced.
    pub fn raise(&mut self, alert: Alert) -> Option<Alert> {
        self.current.replace(alert)
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    /// Clears the slot if it still holds the alert with `id`.
    ///
    /// Returns false when the alert was already replaced or acknowledged.
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        match &self.current {
            Some(alert) if alert.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

/// Response for the alert banner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub alert: Option<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn entry(box_number: u8) -> MedicationEntry {
        MedicationEntry::new(NaiveTime::from_hms_opt(8, 0, 0).unwrap(), box_number)
    }

    #[test]
    fn test_alert_messages() {
        let e = entry(3);
        assert_eq!(
            Alert::due_soon(&e, Utc::now()).message,
            "Time for medication! Please take it from Box 3."
        );
        assert_eq!(
            Alert::overdue(&e, Utc::now()).message,
            "You are late! Please take it from Box 3."
        );
        let wrong = Alert::wrong_box(&e, 5, Utc::now());
        assert_eq!(
            wrong.message,
            "You opened Box 5, but your medication is in Box 3."
        );
        assert_eq!(wrong.opened_box, Some(5));
    }

    #[test]
    fn test_alert_kind_urgency() {
        assert!(!AlertKind::DueSoon.is_urgent());
        assert!(AlertKind::Overdue.is_urgent());
        assert!(AlertKind::WrongBox.is_urgent());
        assert_eq!(AlertKind::WrongBox.to_string(), "wrong_box");
    }

    #[test]
    fn test_slot_overwrites() {
        let e = entry(1);
        let mut slot = AlertSlot::new();
        assert!(slot.raise(Alert::due_soon(&e, Utc::now())).is_none());

        let overdue = Alert::overdue(&e, Utc::now());
        let replaced = slot.raise(overdue.clone()).unwrap();
        assert_eq!(replaced.kind, AlertKind::DueSoon);
        assert_eq!(slot.current(), Some(&overdue));
    }

    #[test]
    fn test_slot_acknowledge() {
        let e = entry(1);
        let mut slot = AlertSlot::new();
        let first = Alert::due_soon(&e, Utc::now());
        slot.raise(first.clone());
        let second = Alert::overdue(&e, Utc::now());
        slot.raise(second.clone());

        assert!(!slot.acknowledge(first.id));
        assert!(slot.current().is_some());
        assert!(slot.acknowledge(second.id));
        assert!(slot.current().is_none());
        assert!(!slot.acknowledge(second.id));
    }

    #[test]
    fn test_alert_serialization_skips_missing_opened_box() {
        let json = serde_json::to_value(Alert::overdue(&entry(2), Utc::now())).unwrap();
        assert_eq!(json["kind"], "overdue");
        assert!(json.get("openedBox").is_none());
    }
}
