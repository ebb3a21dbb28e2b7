//! Beacon domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Display name used when a beacon does not advertise a local name.
pub const UNKNOWN_BEACON_NAME: &str = "Unknown Beacon";

/// Stable platform identifier of a beacon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeaconId(String);

impl BeaconId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, used to label unnamed beacons.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for BeaconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BeaconId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BeaconId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single advertisement as delivered by the radio.
///
/// `manufacturer_data` is the raw vendor-specific payload in CoreBluetooth
/// layout: company identifier (little endian) followed by vendor bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    #[validate(custom(function = "shared::validation::validate_beacon_id"))]
    pub beacon_id: String,

    #[validate(length(max = 64, message = "Beacon name must be at most 64 characters"))]
    pub name: Option<String>,

    pub rssi: i16,

    #[serde(default)]
    pub manufacturer_data: Option<Vec<u8>>,
}

impl Advertisement {
    /// Sensor byte carried in the first byte of the vendor payload.
    pub fn sensor_byte(&self) -> Option<u8> {
        self.manufacturer_data
            .as_ref()
            .and_then(|data| data.first().copied())
    }
}

/// A beacon currently in range. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconObservation {
    pub beacon_id: BeaconId,
    pub name: String,
    pub rssi: i16,
    pub sensor_byte: Option<u8>,
    pub last_seen_at: DateTime<Utc>,
}

impl BeaconObservation {
    pub fn from_advertisement(advertisement: &Advertisement, seen_at: DateTime<Utc>) -> Self {
        Self {
            beacon_id: BeaconId::new(advertisement.beacon_id.clone()),
            name: advertisement
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_BEACON_NAME.to_string()),
            rssi: advertisement.rssi,
            sensor_byte: advertisement.sensor_byte(),
            last_seen_at: seen_at,
        }
    }

    /// Label shown to the user: the advertised name, or the short id when unnamed.
    pub fn display_label(&self) -> String {
        if self.name == UNKNOWN_BEACON_NAME {
            self.beacon_id.short().to_string()
        } else {
            self.name.clone()
        }
    }

    /// Lid state derived from the sensor byte. A missing byte reads as closed.
    pub fn is_open(&self, open_threshold: u8) -> bool {
        self.sensor_byte.unwrap_or(0) > open_threshold
    }
}

/// Power and scan state of the beacon radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioStatus {
    /// Radio missing or powered off; scanning cannot start.
    Unavailable,
    /// Radio powered, not scanning.
    Idle,
    Scanning,
}

impl std::fmt::Display for RadioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadioStatus::Unavailable => write!(f, "unavailable"),
            RadioStatus::Idle => write!(f, "idle"),
            RadioStatus::Scanning => write!(f, "scanning"),
        }
    }
}

/// Request payload for the radio bridge: a batch of advertisements.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestAdvertisementsRequest {
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 advertisements per batch"))]
    #[validate(nested)]
    pub advertisements: Vec<Advertisement>,
}

/// Result of ingesting an advertisement batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAdvertisementsResponse {
    pub accepted: usize,
    pub rejected: usize,
}

/// Request payload for reporting radio power changes.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioPowerRequest {
    pub powered: bool,
}

/// Radio state as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioStatusResponse {
    pub radio: RadioStatus,
    pub scan_requested: bool,
}

/// One observed beacon in the live list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconView {
    #[serde(flatten)]
    pub observation: BeaconObservation,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_number: Option<u8>,
}

/// Response for listing observed beacons.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBeaconsResponse {
    pub radio: RadioStatus,
    pub beacons: Vec<BeaconView>,
    pub total: usize,
}
