//! Adherence monitor.
//!
//! Correlates live beacon state with the medication schedule. [`classify`] is
//! the pure per-entry rule; [`AdherenceMonitor`] applies it on every tick and
//! keeps the per-entry memory needed to raise alerts on transitions only.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::mapping_store::MappingStore;
use crate::models::{
    Alert, AlertKind, BeaconObservation, CoverState, DoseStatus, EntryStatus, MedicationEntry,
    MonitorThresholds,
};

/// Classifies one dose at `now` (local wall clock).
///
/// `observation` is the live observation of the beacon mapped to the entry's
/// box, if any.
pub fn classify(
    entry: &MedicationEntry,
    observation: Option<&BeaconObservation>,
    now: NaiveDateTime,
    thresholds: &MonitorThresholds,
) -> DoseStatus {
    let Some(observation) = observation else {
        return DoseStatus::Unknown;
    };

    let scheduled_at = entry.scheduled_on(now.date());
    if now < scheduled_at {
        return DoseStatus::Pending;
    }

    let elapsed = now - scheduled_at;
    if observation.is_open(thresholds.sensor_open_threshold) {
        DoseStatus::Resolved {
            late: elapsed >= thresholds.due_window,
        }
    } else if elapsed < thresholds.due_window {
        DoseStatus::DueSoon
    } else {
        DoseStatus::Overdue
    }
}

/// A wrong-box notification to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongBoxEvent {
    pub entry: MedicationEntry,
    pub opened_box: u8,
}

/// Result of one evaluation tick.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub statuses: Vec<EntryStatus>,
    /// Newly raised alerts, in raise order. The last one wins the alert slot.
    pub alerts: Vec<Alert>,
    pub wrong_box: Vec<WrongBoxEvent>,
}

#[derive(Debug)]
pub struct AdherenceMonitor {
    thresholds: MonitorThresholds,
    /// Alerting status last raised per entry.
    last_alerted: HashMap<Uuid, AlertKind>,
    /// Scheduled instant at which each entry was seen taken, and whether late.
    taken: HashMap<Uuid, (NaiveDateTime, bool)>,
    /// (entry, opened box) pairs already reported.
    wrong_box_reported: HashSet<(Uuid, u8)>,
}

impl AdherenceMonitor {
    pub fn new(thresholds: MonitorThresholds) -> Self {
        Self {
            thresholds,
            last_alerted: HashMap::new(),
            taken: HashMap::new(),
            wrong_box_reported: HashSet::new(),
        }
    }

    pub fn thresholds(&self) -> &MonitorThresholds {
        &self.thresholds
    }

    /// Current statuses without touching alert state.
    pub fn statuses(
        &self,
        now: NaiveDateTime,
        entries: &[MedicationEntry],
        mappings: &MappingStore,
        observations: &[BeaconObservation],
    ) -> Vec<EntryStatus> {
        entries
            .iter()
            .map(|entry| self.entry_status(entry, now, mappings, observations))
            .collect()
    }

    /// Runs one tick over every entry.
    pub fn evaluate(
        &mut self,
        now: NaiveDateTime,
        entries: &[MedicationEntry],
        mappings: &MappingStore,
        observations: &[BeaconObservation],
    ) -> Evaluation {
        self.prune(entries);

        let raised_at = Utc::now();
        let mut evaluation = Evaluation::default();
        let mut wrong_box_active = HashSet::new();

        for entry in entries {
            let status = self.entry_status(entry, now, mappings, observations);

            if let DoseStatus::Resolved { late } = status.status {
                if self.taken.get(&entry.id).map(|(at, _)| *at) != Some(status.scheduled_at) {
                    info!(
                        entry_id = %entry.id,
                        box_number = entry.box_number,
                        late,
                        "Medication taken"
                    );
                }
                self.taken.insert(entry.id, (status.scheduled_at, late));
            }

            match status.status {
                DoseStatus::DueSoon | DoseStatus::Overdue => {
                    let (kind, alert) = if status.status == DoseStatus::DueSoon {
                        (AlertKind::DueSoon, Alert::due_soon(entry, raised_at))
                    } else {
                        (AlertKind::Overdue, Alert::overdue(entry, raised_at))
                    };
                    if self.last_alerted.insert(entry.id, kind) != Some(kind) {
                        info!(
                            entry_id = %entry.id,
                            box_number = entry.box_number,
                            kind = %kind,
                            "Adherence alert raised"
                        );
                        evaluation.alerts.push(alert);
                    }
                }
                DoseStatus::Pending | DoseStatus::Resolved { .. } => {
                    self.last_alerted.remove(&entry.id);
                }
                DoseStatus::Unknown => {}
            }

            // Runs even when the entry's own beacon is unseen.
            if now >= status.scheduled_at && !status.status.is_resolved() {
                for opened_box in self.open_other_boxes(entry, mappings, observations) {
                    wrong_box_active.insert((entry.id, opened_box));
                    if self.wrong_box_reported.insert((entry.id, opened_box)) {
                        info!(
                            entry_id = %entry.id,
                            box_number = entry.box_number,
                            opened_box,
                            "Wrong box opened"
                        );
                        evaluation
                            .alerts
                            .push(Alert::wrong_box(entry, opened_box, raised_at));
                        evaluation.wrong_box.push(WrongBoxEvent {
                            entry: entry.clone(),
                            opened_box,
                        });
                    }
                }
            }

            debug!(entry_id = %entry.id, status = %status.status, "Dose evaluated");
            evaluation.statuses.push(status);
        }

        self.wrong_box_reported
            .retain(|key| wrong_box_active.contains(key));
        evaluation
    }

    /// Drops all remembered state for an entry.
    pub fn forget(&mut self, entry_id: Uuid) {
        self.last_alerted.remove(&entry_id);
        self.taken.remove(&entry_id);
        self.wrong_box_reported.retain(|(id, _)| *id != entry_id);
    }

    fn prune(&mut self, entries: &[MedicationEntry]) {
        let live: HashSet<Uuid> = entries.iter().map(|e| e.id).collect();
        self.last_alerted.retain(|id, _| live.contains(id));
        self.taken.retain(|id, _| live.contains(id));
        self.wrong_box_reported.retain(|(id, _)| live.contains(id));
    }

    fn entry_status(
        &self,
        entry: &MedicationEntry,
        now: NaiveDateTime,
        mappings: &MappingStore,
        observations: &[BeaconObservation],
    ) -> EntryStatus {
        let scheduled_at = entry.scheduled_on(now.date());
        let beacon_id = mappings.beacon_for_box(entry.box_number).cloned();
        let observation = beacon_id
            .as_ref()
            .and_then(|id| observations.iter().find(|o| &o.beacon_id == id));

        let mut status = classify(entry, observation, now, &self.thresholds);
        if status != DoseStatus::Pending {
            if let Some(&(taken_for, late)) = self.taken.get(&entry.id) {
                if taken_for == scheduled_at {
                    status = DoseStatus::Resolved { late };
                }
            }
        }

        let cover = observation.map(|o| {
            if o.is_open(self.thresholds.sensor_open_threshold) {
                CoverState::Open
            } else {
                CoverState::Closed
            }
        });

        EntryStatus {
            entry: entry.clone(),
            scheduled_at,
            status,
            beacon_id,
            cover,
        }
    }

    /// Mapped boxes other than the entry's own that currently read open.
    fn open_other_boxes(
        &self,
        entry: &MedicationEntry,
        mappings: &MappingStore,
        observations: &[BeaconObservation],
    ) -> Vec<u8> {
        let mut boxes: Vec<u8> = observations
            .iter()
            .filter(|o| o.is_open(self.thresholds.sensor_open_threshold))
            .filter_map(|o| mappings.box_for(&o.beacon_id))
            .filter(|&b| b != entry.box_number)
            .collect();
        boxes.sort_unstable();
        boxes.dedup();
        boxes
    }
}
