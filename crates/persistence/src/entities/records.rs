//! Persisted JSON records.
//!
//! Collections are stored as JSON arrays of these records. Field names match
//! the layout written by earlier app versions so existing data keeps loading.

use domain::models::{BeaconId, BeaconMapping, MedicationEntry};
use serde::{Deserialize, Serialize};
use shared::clock::{format_time_of_day, parse_time_of_day, TimeOfDayError};
use uuid::Uuid;

/// One element of the beacon mappings array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconMappingRecord {
    pub beacon_id: String,
    pub box_number: u8,
}

impl From<BeaconMappingRecord> for BeaconMapping {
    fn from(record: BeaconMappingRecord) -> Self {
        Self {
            beacon_id: BeaconId::from(record.beacon_id),
            box_number: record.box_number,
        }
    }
}

impl From<&BeaconMapping> for BeaconMappingRecord {
    fn from(mapping: &BeaconMapping) -> Self {
        Self {
            beacon_id: mapping.beacon_id.as_str().to_string(),
            box_number: mapping.box_number,
        }
    }
}

/// One element of the medication entries array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    pub id: Uuid,
    /// `HH:MM`
    pub time: String,
    pub box_number: u8,
}

impl TryFrom<MedicationRecord> for MedicationEntry {
    type Error = TimeOfDayError;

    fn try_from(record: MedicationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            time: parse_time_of_day(&record.time)?,
            box_number: record.box_number,
        })
    }
}

impl From<&MedicationEntry> for MedicationRecord {
    fn from(entry: &MedicationEntry) -> Self {
        Self {
            id: entry.id,
            time: format_time_of_day(entry.time),
            box_number: entry.box_number,
        }
    }
}
