//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::models::BeaconId;

/// Rejected domain operations.
///
/// Conflicts are reported by the stores themselves so callers cannot break
/// the one-box-per-beacon and one-medication-per-box rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Box {box_number} is outside the configured range 1..={box_count}")]
    BoxOutOfRange { box_number: u8, box_count: u8 },

    #[error("Box {box_number} is already assigned to beacon {beacon_id}")]
    BoxAlreadyAssigned { box_number: u8, beacon_id: BeaconId },

    #[error("Beacon {beacon_id} is already assigned to box {box_number}")]
    BeaconAlreadyMapped { beacon_id: BeaconId, box_number: u8 },

    #[error("No mapping exists for beacon {0}")]
    MappingNotFound(BeaconId),

    #[error("Box {box_number} already holds medication {entry_id}")]
    BoxAlreadyScheduled { box_number: u8, entry_id: Uuid },

    #[error("Box {0} appears more than once in the batch")]
    DuplicateBoxInBatch(u8),

    #[error("Medication entry {0} not found")]
    EntryNotFound(Uuid),

    #[error("Bluetooth radio is unavailable")]
    RadioUnavailable,
}

impl DomainError {
    /// Whether the error is a uniqueness conflict (as opposed to a missing record).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::BoxAlreadyAssigned { .. }
                | DomainError::BeaconAlreadyMapped { .. }
                | DomainError::BoxAlreadyScheduled { .. }
                | DomainError::DuplicateBoxInBatch(_)
        )
    }

    /// Whether the error refers to a record that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::MappingNotFound(_) | DomainError::EntryNotFound(_)
        )
    }
}
