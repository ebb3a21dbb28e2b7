//! Common validation utilities.

use validator::ValidationError;

/// Largest box count any deployment may configure.
pub const MAX_BOX_COUNT: u8 = 99;

/// Box count of the reference pill organiser.
pub const DEFAULT_BOX_COUNT: u8 = 10;

/// Maximum length of a beacon identifier.
const MAX_BEACON_ID_LENGTH: usize = 128;

/// Validates that a box number is within the absolute supported range (1 to 99).
///
/// The configured range of a given deployment is narrower and checked by the
/// stores; this only rejects values no deployment can have.
pub fn validate_box_number(box_number: u8) -> Result<(), ValidationError> {
    if (1..=MAX_BOX_COUNT).contains(&box_number) {
        Ok(())
    } else {
        let mut err = ValidationError::new("box_number_range");
        err.message = Some(format!("Box number must be between 1 and {}", MAX_BOX_COUNT).into());
        Err(err)
    }
}

/// Returns true when `box_number` lies in `1..=box_count`.
pub fn box_in_range(box_number: u8, box_count: u8) -> bool {
    box_number >= 1 && box_number <= box_count
}

/// Validates a beacon identifier as reported by the radio.
///
/// Identifiers are opaque platform strings (CoreBluetooth UUIDs, BlueZ
/// addresses), so only emptiness, length and control characters are checked.
pub fn validate_beacon_id(beacon_id: &str) -> Result<(), ValidationError> {
    let trimmed = beacon_id.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("beacon_id_empty");
        err.message = Some("Beacon id cannot be empty".into());
        return Err(err);
    }
    if beacon_id.len() > MAX_BEACON_ID_LENGTH {
        let mut err = ValidationError::new("beacon_id_length");
        err.message =
            Some(format!("Beacon id must be at most {} characters", MAX_BEACON_ID_LENGTH).into());
        return Err(err);
    }
    if beacon_id.chars().any(|c| c.is_control()) {
        let mut err = ValidationError::new("beacon_id_chars");
        err.message = Some("Beacon id cannot contain control characters".into());
        return Err(err);
    }
    Ok(())
}
