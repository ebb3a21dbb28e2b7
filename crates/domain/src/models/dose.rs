//! Dose status and monitoring thresholds.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::beacon::BeaconId;
use super::medication::MedicationEntry;

pub const DEFAULT_RSSI_THRESHOLD: i16 = -55;
pub const DEFAULT_SENSOR_OPEN_THRESHOLD: u8 = 128;
pub const DEFAULT_DUE_WINDOW_SECS: i64 = 60;

/// Constants the adherence logic is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorThresholds {
    /// Advertisements weaker than this (dBm) are dropped.
    pub rssi_threshold: i16,
    /// Sensor bytes strictly above this read as "lid open".
    pub sensor_open_threshold: u8,
    /// How long after the scheduled time a closed box is "due" rather than "overdue".
    pub due_window: Duration,
    /// Boxes are numbered `1..=box_count`.
    pub box_count: u8,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            rssi_threshold: DEFAULT_RSSI_THRESHOLD,
            sensor_open_threshold: DEFAULT_SENSOR_OPEN_THRESHOLD,
            due_window: Duration::seconds(DEFAULT_DUE_WINDOW_SECS),
            box_count: shared::validation::DEFAULT_BOX_COUNT,
        }
    }
}

/// Dosing status of one entry at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DoseStatus {
    /// No live beacon for the entry's box.
    Unknown,
    /// Scheduled time not reached yet.
    Pending,
    /// Scheduled time reached, box closed, still inside the due window.
    DueSoon,
    /// Due window elapsed, box closed.
    Overdue,
    /// Box opened at or after the scheduled time.
    Resolved { late: bool },
}

impl DoseStatus {
    /// Whether the dose was seen taken.
    pub fn is_resolved(&self) -> bool {
        matches!(self, DoseStatus::Resolved { .. })
    }
}

impl std::fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoseStatus::Unknown => write!(f, "unknown"),
            DoseStatus::Pending => write!(f, "pending"),
            DoseStatus::DueSoon => write!(f, "due_soon"),
            DoseStatus::Overdue => write!(f, "overdue"),
            DoseStatus::Resolved { late: false } => write!(f, "resolved"),
            DoseStatus::Resolved { late: true } => write!(f, "resolved_late"),
        }
    }
}

/// Lid state of a box as last reported by its beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverState {
    Open,
    Closed,
}

/// Status row for one medication entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub entry: MedicationEntry,
    pub scheduled_at: NaiveDateTime,
    pub status: DoseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon_id: Option<BeaconId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<CoverState>,
}

/// Response for the schedule status view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatusResponse {
    pub evaluated_at: NaiveDateTime,
    pub statuses: Vec<EntryStatus>,
}
