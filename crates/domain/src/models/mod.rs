//! Domain models for Pillwatch.

pub mod alert;
pub mod beacon;
pub mod dose;
pub mod mapping;
pub mod medication;

pub use alert::{Alert, AlertKind, AlertResponse, AlertSlot};
pub use beacon::{
    Advertisement, BeaconId, BeaconObservation, BeaconView, IngestAdvertisementsRequest,
    IngestAdvertisementsResponse, ListBeaconsResponse, RadioPowerRequest, RadioStatus,
    RadioStatusResponse, UNKNOWN_BEACON_NAME,
};
pub use dose::{CoverState, DoseStatus, EntryStatus, MonitorThresholds, ScheduleStatusResponse};
pub use mapping::{
    AssignBeaconRequest, AssignableBeacon, BeaconMapping, ListMappingsResponse,
    UnassignedBeaconsResponse,
};
pub use medication::{
    AddMedicationsRequest, AvailableBoxesQuery, AvailableBoxesResponse, ListMedicationsResponse,
    MedicationEntry, NewMedication, UpdateMedicationRequest,
};
