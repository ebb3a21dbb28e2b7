//! Beacon-to-box mapping domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::beacon::BeaconId;

/// Persisted association between a beacon and a numbered medication box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconMapping {
    pub beacon_id: BeaconId,
    pub box_number: u8,
}

/// Request payload for assigning a beacon to a box.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignBeaconRequest {
    #[validate(custom(function = "shared::validation::validate_beacon_id"))]
    pub beacon_id: String,

    #[validate(custom(function = "shared::validation::validate_box_number"))]
    pub box_number: u8,
}

/// Response for listing mappings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMappingsResponse {
    pub mappings: Vec<BeaconMapping>,
    pub total: usize,
}

/// An observed beacon that is not yet mapped, with the boxes it may take.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignableBeacon {
    pub beacon_id: BeaconId,
    pub label: String,
    pub rssi: i16,
    pub available_boxes: Vec<u8>,
}

/// Response listing beacons that can still be assigned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedBeaconsResponse {
    pub beacons: Vec<AssignableBeacon>,
    pub total: usize,
}
