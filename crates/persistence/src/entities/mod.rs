//! Database entity definitions.
//!
//! Entities are direct mappings to database rows; records are the JSON
//! elements stored inside a row's value.

pub mod key_value;
pub mod records;

pub use key_value::KeyValueEntity;
pub use records::{BeaconMappingRecord, MedicationRecord};
