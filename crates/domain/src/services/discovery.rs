//! Beacon discovery service.
//!
//! Keeps the live, deduplicated set of beacons in range and publishes it to
//! subscribers. The radio itself is an external collaborator that feeds
//! power changes and advertisements into this service.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::DomainError;
use crate::models::{Advertisement, BeaconId, BeaconObservation, RadioStatus};

/// What happened to an advertisement handed to [`BeaconDiscovery::handle_advertisement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementOutcome {
    /// First sighting since the scan started.
    Inserted,
    /// Replaced the previous observation of the same beacon.
    Updated,
    /// Signal below the RSSI threshold; dropped.
    TooWeak,
    /// Not scanning; dropped.
    NotScanning,
}

impl AdvertisementOutcome {
    pub fn accepted(&self) -> bool {
        matches!(
            self,
            AdvertisementOutcome::Inserted | AdvertisementOutcome::Updated
        )
    }
}

/// Live view of nearby beacons.
#[derive(Debug)]
pub struct BeaconDiscovery {
    rssi_threshold: i16,
    status: RadioStatus,
    /// A scan was asked for and not stopped; resumed when the radio powers on.
    scan_requested: bool,
    observed: Vec<BeaconObservation>,
    publisher: watch::Sender<Vec<BeaconObservation>>,
}

impl BeaconDiscovery {
    /// Creates the service with the radio assumed unavailable until reported otherwise.
    pub fn new(rssi_threshold: i16) -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self {
            rssi_threshold,
            status: RadioStatus::Unavailable,
            scan_requested: false,
            observed: Vec::new(),
            publisher,
        }
    }

    pub fn status(&self) -> RadioStatus {
        self.status
    }

    pub fn scan_requested(&self) -> bool {
        self.scan_requested
    }

    /// Records a radio power change.
    ///
    /// Powering on while a scan is requested starts it; powering off makes the
    /// radio unavailable but keeps the last observations.
    pub fn set_radio_powered(&mut self, powered: bool) {
        match (powered, self.status) {
            (true, RadioStatus::Unavailable) => {
                info!("Beacon radio powered on");
                self.status = RadioStatus::Idle;
                if self.scan_requested {
                    self.begin_scan();
                }
            }
            (false, RadioStatus::Idle | RadioStatus::Scanning) => {
                warn!("Beacon radio unavailable");
                self.status = RadioStatus::Unavailable;
            }
            _ => {}
        }
    }

    /// Starts (or restarts) scanning, clearing the observed set.
    ///
    /// Returns [`DomainError::RadioUnavailable`] when the radio is off; the
    /// request is remembered and the scan starts once the radio powers on.
    pub fn start_scanning(&mut self) -> Result<(), DomainError> {
        self.scan_requested = true;
        if self.status == RadioStatus::Unavailable {
            warn!("Scan requested while beacon radio is unavailable");
            return Err(DomainError::RadioUnavailable);
        }
        self.begin_scan();
        Ok(())
    }

    /// Halts scanning. Observations are kept.
    pub fn stop_scanning(&mut self) {
        self.scan_requested = false;
        if self.status == RadioStatus::Scanning {
            info!(observed = self.observed.len(), "Beacon scan stopped");
            self.status = RadioStatus::Idle;
        }
    }

    fn begin_scan(&mut self) {
        self.observed.clear();
        self.publish();
        self.status = RadioStatus::Scanning;
        info!(rssi_threshold = self.rssi_threshold, "Beacon scan started");
    }

    /// Applies one advertisement: RSSI filter, then last-write-wins upsert.
    pub fn handle_advertisement(
        &mut self,
        advertisement: &Advertisement,
        seen_at: DateTime<Utc>,
    ) -> AdvertisementOutcome {
        if self.status != RadioStatus::Scanning {
            return AdvertisementOutcome::NotScanning;
        }
        if advertisement.rssi < self.rssi_threshold {
            return AdvertisementOutcome::TooWeak;
        }

        let observation = BeaconObservation::from_advertisement(advertisement, seen_at);
        let outcome = match self
            .observed
            .iter_mut()
            .find(|o| o.beacon_id == observation.beacon_id)
        {
            Some(existing) => {
                *existing = observation;
                AdvertisementOutcome::Updated
            }
            None => {
                debug!(
                    beacon_id = %observation.beacon_id,
                    rssi = observation.rssi,
                    "New beacon in range"
                );
                self.observed.push(observation);
                AdvertisementOutcome::Inserted
            }
        };
        self.publish();
        outcome
    }

    pub fn observations(&self) -> &[BeaconObservation] {
        &self.observed
    }

    pub fn observation(&self, beacon_id: &BeaconId) -> Option<&BeaconObservation> {
        self.observed.iter().find(|o| &o.beacon_id == beacon_id)
    }

    /// Receiver that sees every published snapshot of the observed set.
    pub fn subscribe(&self) -> watch::Receiver<Vec<BeaconObservation>> {
        self.publisher.subscribe()
    }

    fn publish(&self) {
        self.publisher.send_replace(self.observed.clone());
    }
}
