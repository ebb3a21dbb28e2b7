//! Medication schedule store.
//!
//! Entries are kept in insertion order. At most one entry per box.

use std::collections::HashSet;

use chrono::NaiveTime;
use tracing::{info, warn};
use uuid::Uuid;

use shared::validation::box_in_range;

use crate::error::DomainError;
use crate::models::{MedicationEntry, NewMedication};

#[derive(Debug, Clone)]
pub struct ScheduleStore {
    box_count: u8,
    entries: Vec<MedicationEntry>,
}

impl ScheduleStore {
    pub fn new(box_count: u8) -> Self {
        Self {
            box_count,
            entries: Vec::new(),
        }
    }

    /// Builds the store from persisted entries, reporting box collisions.
    pub fn with_entries(box_count: u8, entries: Vec<MedicationEntry>) -> Self {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.box_number) {
                warn!(
                    entry_id = %entry.id,
                    box_number = entry.box_number,
                    "Persisted medication entry shares a box with an earlier one"
                );
            }
        }
        Self { box_count, entries }
    }

    pub fn entries(&self) -> &[MedicationEntry] {
        &self.entries
    }

    pub fn get(&self, id: Uuid) -> Option<&MedicationEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry_for_box(&self, box_number: u8) -> Option<&MedicationEntry> {
        self.entries.iter().find(|e| e.box_number == box_number)
    }

    /// Adds a single entry.
    pub fn add(&mut self, time: NaiveTime, box_number: u8) -> Result<MedicationEntry, DomainError> {
        let mut added = self.add_batch(&[NewMedication { time, box_number }])?;
        Ok(added.remove(0))
    }

    /// Adds several entries atomically: either all are stored or none is.
    pub fn add_batch(
        &mut self,
        batch: &[NewMedication],
    ) -> Result<Vec<MedicationEntry>, DomainError> {
        let mut staged = HashSet::new();
        for row in batch {
            self.check_box(row.box_number, None)?;
            if !staged.insert(row.box_number) {
                return Err(DomainError::DuplicateBoxInBatch(row.box_number));
            }
        }

        let added: Vec<MedicationEntry> = batch
            .iter()
            .map(|row| MedicationEntry::new(row.time, row.box_number))
            .collect();
        for entry in &added {
            info!(
                entry_id = %entry.id,
                time = %shared::clock::format_time_of_day(entry.time),
                box_number = entry.box_number,
                "Medication entry added"
            );
        }
        self.entries.extend(added.iter().cloned());
        Ok(added)
    }

    /// Replaces an entry's time and box, keeping its id.
    ///
    /// Returns the updated entry together with the previous version.
    pub fn update(
        &mut self,
        id: Uuid,
        time: NaiveTime,
        box_number: u8,
    ) -> Result<(MedicationEntry, MedicationEntry), DomainError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(DomainError::EntryNotFound(id))?;
        self.check_box(box_number, Some(id))?;

        let previous = self.entries[index].clone();
        let updated = MedicationEntry {
            id,
            time: shared::clock::truncate_to_minute(time),
            box_number,
        };
        self.entries[index] = updated.clone();
        info!(
            entry_id = %id,
            time = %shared::clock::format_time_of_day(updated.time),
            box_number,
            "Medication entry updated"
        );
        Ok((updated, previous))
    }

    pub fn delete(&mut self, id: Uuid) -> Result<MedicationEntry, DomainError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(DomainError::EntryNotFound(id))?;
        let removed = self.entries.remove(index);
        info!(
            entry_id = %id,
            box_number = removed.box_number,
            "Medication entry deleted"
        );
        Ok(removed)
    }

    /// Boxes selectable for an add/edit row, ascending.
    ///
    /// Excludes boxes used by saved entries and by other unsaved rows. The
    /// box of the entry being edited is always offered.
    pub fn available_boxes(&self, excluding: Option<Uuid>, staged: &[u8]) -> Vec<u8> {
        let own_box = excluding.and_then(|id| self.get(id)).map(|e| e.box_number);
        (1..=self.box_count)
            .filter(|&b| {
                if Some(b) == own_box {
                    return true;
                }
                let saved = self.entries.iter().any(|e| e.box_number == b);
                !saved && !staged.contains(&b)
            })
            .collect()
    }

    fn check_box(&self, box_number: u8, excluding: Option<Uuid>) -> Result<(), DomainError> {
        if !box_in_range(box_number, self.box_count) {
            return Err(DomainError::BoxOutOfRange {
                box_number,
                box_count: self.box_count,
            });
        }
        match self.entry_for_box(box_number) {
            Some(existing) if Some(existing.id) != excluding => {
                Err(DomainError::BoxAlreadyScheduled {
                    box_number,
                    entry_id: existing.id,
                })
            }
            _ => Ok(()),
        }
    }
}
