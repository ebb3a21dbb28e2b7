//! Medication schedule domain model.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::clock::{hh_mm, scheduled_on, truncate_to_minute};

/// A scheduled daily dose: a wall-clock time and the box holding the medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationEntry {
    pub id: Uuid,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub box_number: u8,
}

impl MedicationEntry {
    /// Creates an entry with a fresh id. Seconds are dropped from `time`.
    pub fn new(time: NaiveTime, box_number: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: truncate_to_minute(time),
            box_number,
        }
    }

    /// The scheduled instant of this dose on `date`.
    pub fn scheduled_on(&self, date: NaiveDate) -> NaiveDateTime {
        scheduled_on(date, self.time)
    }
}

/// One row of an add-medication batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,

    #[validate(custom(function = "shared::validation::validate_box_number"))]
    pub box_number: u8,
}

/// Request payload for adding one or more medication times.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMedicationsRequest {
    #[validate(length(min = 1, max = 99, message = "Between 1 and 99 entries may be added at once"))]
    #[validate(nested)]
    pub entries: Vec<NewMedication>,
}

/// Request payload for editing an entry (time and box are both replaced).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicationRequest {
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,

    #[validate(custom(function = "shared::validation::validate_box_number"))]
    pub box_number: u8,
}

/// Response for listing medication entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMedicationsResponse {
    pub medications: Vec<MedicationEntry>,
    pub total: usize,
}

/// Query parameters for the box options of an add/edit row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableBoxesQuery {
    /// Entry being edited; its own box stays selectable.
    pub excluding: Option<Uuid>,
    /// Comma-separated boxes already picked by other unsaved rows.
    pub staged: Option<String>,
}

impl AvailableBoxesQuery {
    /// Parses the `staged` list. Blank items are ignored.
    pub fn staged_boxes(&self) -> Result<Vec<u8>, String> {
        let Some(raw) = self.staged.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u8>()
                    .map_err(|_| format!("Invalid staged box number: {}", s))
            })
            .collect()
    }
}

/// Response listing selectable box numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableBoxesResponse {
    pub boxes: Vec<u8>,
}
