//! Repository implementations for database operations.

pub mod beacon_mapping;
pub mod key_value;
pub mod medication;

pub use beacon_mapping::{BeaconMappingRepository, BEACON_MAPPINGS_KEY};
pub use key_value::KeyValueRepository;
pub use medication::{MedicationRepository, MEDICATIONS_KEY};
