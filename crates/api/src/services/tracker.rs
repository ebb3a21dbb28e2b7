//! Medication tracker.
//!
//! Owns the discovery service, both stores, the adherence monitor and the
//! alert slot behind one lock so every mutation is serialized. Store
//! mutations are written through to SQLite before the call returns; a failed
//! write is logged and the in-memory state is kept.

use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime, Utc};
use domain::models::{
    Advertisement, Alert, AlertSlot, BeaconId, BeaconMapping, BeaconObservation, BeaconView,
    IngestAdvertisementsResponse, ListBeaconsResponse, MedicationEntry, MonitorThresholds,
    NewMedication, RadioStatusResponse, ScheduleStatusResponse, UnassignedBeaconsResponse,
};
use domain::services::{
    AdherenceMonitor, BeaconDiscovery, Evaluation, MappingStore, NotificationSurface,
    ReminderScheduler, ScheduleStore,
};
use domain::DomainError;
use metrics::counter;
use persistence::repositories::{BeaconMappingRepository, MedicationRepository};
use sqlx::SqlitePool;
use tokio::sync::{watch, Mutex};
use tracing::{error, info};
use uuid::Uuid;

struct TrackerState {
    discovery: BeaconDiscovery,
    mappings: MappingStore,
    schedule: ScheduleStore,
    monitor: AdherenceMonitor,
    alert: AlertSlot,
}

impl TrackerState {
    fn radio_status(&self) -> RadioStatusResponse {
        RadioStatusResponse {
            radio: self.discovery.status(),
            scan_requested: self.discovery.scan_requested(),
        }
    }
}

#[derive(Clone)]
pub struct Tracker {
    state: Arc<Mutex<TrackerState>>,
    mapping_repo: BeaconMappingRepository,
    medication_repo: MedicationRepository,
    reminders: ReminderScheduler,
    thresholds: MonitorThresholds,
    scan_requested: Arc<watch::Sender<bool>>,
}

impl Tracker {
    /// Restores persisted mappings and entries and re-registers every reminder.
    pub async fn load(
        pool: SqlitePool,
        surface: Arc<dyn NotificationSurface>,
        thresholds: MonitorThresholds,
        now: NaiveDateTime,
    ) -> Self {
        let mapping_repo = BeaconMappingRepository::new(pool.clone());
        let medication_repo = MedicationRepository::new(pool);

        let mappings = mapping_repo.load_or_default().await;
        let entries = medication_repo.load_or_default().await;
        info!(
            mappings = mappings.len(),
            medications = entries.len(),
            box_count = thresholds.box_count,
            "Tracker state restored"
        );

        let reminders = ReminderScheduler::new(surface);
        for entry in &entries {
            reminders.schedule_reminder(entry, now).await;
        }

        let state = TrackerState {
            discovery: BeaconDiscovery::new(thresholds.rssi_threshold),
            mappings: MappingStore::with_mappings(thresholds.box_count, mappings),
            schedule: ScheduleStore::with_entries(thresholds.box_count, entries),
            monitor: AdherenceMonitor::new(thresholds),
            alert: AlertSlot::new(),
        };
        let (scan_requested, _) = watch::channel(false);

        Self {
            state: Arc::new(Mutex::new(state)),
            mapping_repo,
            medication_repo,
            reminders,
            thresholds,
            scan_requested: Arc::new(scan_requested),
        }
    }

    pub fn thresholds(&self) -> &MonitorThresholds {
        &self.thresholds
    }

    // Radio and discovery

    pub async fn radio_status(&self) -> RadioStatusResponse {
        self.state.lock().await.radio_status()
    }

    pub async fn set_radio_powered(&self, powered: bool) -> RadioStatusResponse {
        let mut state = self.state.lock().await;
        state.discovery.set_radio_powered(powered);
        state.radio_status()
    }

    /// Starts scanning. The request is remembered even when the radio is off.
    pub async fn start_scanning(&self) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let result = state.discovery.start_scanning();
        self.scan_requested.send_replace(state.discovery.scan_requested());
        result
    }

    pub async fn stop_scanning(&self) {
        let mut state = self.state.lock().await;
        state.discovery.stop_scanning();
        self.scan_requested.send_replace(false);
    }

    /// Follows whether a scan is currently wanted, for radio drivers.
    pub fn watch_scan_requested(&self) -> watch::Receiver<bool> {
        self.scan_requested.subscribe()
    }

    pub async fn subscribe_observations(&self) -> watch::Receiver<Vec<BeaconObservation>> {
        self.state.lock().await.discovery.subscribe()
    }

    /// Feeds a batch of advertisements into discovery.
    pub async fn ingest(&self, advertisements: &[Advertisement]) -> IngestAdvertisementsResponse {
        let seen_at = Utc::now();
        let mut state = self.state.lock().await;
        let mut response = IngestAdvertisementsResponse::default();
        for advertisement in advertisements {
            if state
                .discovery
                .handle_advertisement(advertisement, seen_at)
                .accepted()
            {
                response.accepted += 1;
            } else {
                response.rejected += 1;
            }
        }
        counter!("beacon_advertisements_total", "accepted" => "true")
            .increment(response.accepted as u64);
        counter!("beacon_advertisements_total", "accepted" => "false")
            .increment(response.rejected as u64);
        response
    }

    pub async fn list_beacons(&self) -> ListBeaconsResponse {
        let state = self.state.lock().await;
        let beacons: Vec<BeaconView> = state
            .discovery
            .observations()
            .iter()
            .map(|o| BeaconView {
                label: o.display_label(),
                box_number: state.mappings.box_for(&o.beacon_id),
                observation: o.clone(),
            })
            .collect();
        ListBeaconsResponse {
            radio: state.discovery.status(),
            total: beacons.len(),
            beacons,
        }
    }

    // Beacon mappings

    pub async fn mappings(&self) -> Vec<BeaconMapping> {
        self.state.lock().await.mappings.mappings().to_vec()
    }

    pub async fn unassigned_beacons(&self) -> UnassignedBeaconsResponse {
        let state = self.state.lock().await;
        let beacons = state
            .mappings
            .assignable_beacons(state.discovery.observations());
        UnassignedBeaconsResponse {
            total: beacons.len(),
            beacons,
        }
    }

    pub async fn assign(
        &self,
        beacon_id: BeaconId,
        box_number: u8,
    ) -> Result<BeaconMapping, DomainError> {
        let mut state = self.state.lock().await;
        let mapping = state.mappings.assign(beacon_id, box_number)?;
        self.save_mappings(&state.mappings).await;
        Ok(mapping)
    }

    pub async fn unassign(&self, beacon_id: &BeaconId) -> Result<BeaconMapping, DomainError> {
        let mut state = self.state.lock().await;
        let removed = state.mappings.unassign(beacon_id)?;
        self.save_mappings(&state.mappings).await;
        Ok(removed)
    }

    async fn save_mappings(&self, mappings: &MappingStore) {
        if let Err(e) = self.mapping_repo.save_all(mappings.mappings()).await {
            error!(error = %e, "Failed to persist beacon mappings");
        }
    }

    // Medication schedule

    pub async fn medications(&self) -> Vec<MedicationEntry> {
        self.state.lock().await.schedule.entries().to_vec()
    }

    pub async fn available_boxes(&self, excluding: Option<Uuid>, staged: &[u8]) -> Vec<u8> {
        self.state
            .lock()
            .await
            .schedule
            .available_boxes(excluding, staged)
    }

    /// Adds a batch of entries and schedules their reminders.
    pub async fn add_medications(
        &self,
        batch: &[NewMedication],
        now: NaiveDateTime,
    ) -> Result<Vec<MedicationEntry>, DomainError> {
        let mut state = self.state.lock().await;
        let added = state.schedule.add_batch(batch)?;
        self.save_medications(&state.schedule).await;
        for entry in &added {
            self.reminders.schedule_reminder(entry, now).await;
        }
        Ok(added)
    }

    /// Replaces an entry's time and box and reschedules its reminder.
    pub async fn update_medication(
        &self,
        id: Uuid,
        time: NaiveTime,
        box_number: u8,
        now: NaiveDateTime,
    ) -> Result<MedicationEntry, DomainError> {
        let mut state = self.state.lock().await;
        let (updated, previous) = state.schedule.update(id, time, box_number)?;
        if updated != previous {
            state.monitor.forget(id);
        }
        self.save_medications(&state.schedule).await;
        // Cancel and re-register under the lock, ordered with deletes.
        self.reminders.cancel_reminder(id).await;
        self.reminders.schedule_reminder(&updated, now).await;
        Ok(updated)
    }

    /// Deletes an entry, cancelling its notifications and any alert about it.
    pub async fn delete_medication(&self, id: Uuid) -> Result<MedicationEntry, DomainError> {
        let mut state = self.state.lock().await;
        let removed = state.schedule.delete(id)?;
        state.monitor.forget(id);
        let stale_alert = state
            .alert
            .current()
            .filter(|alert| alert.entry_id == id)
            .map(|alert| alert.id);
        if let Some(alert_id) = stale_alert {
            state.alert.acknowledge(alert_id);
        }
        self.save_medications(&state.schedule).await;
        self.reminders.cancel_reminder(id).await;
        Ok(removed)
    }

    async fn save_medications(&self, schedule: &ScheduleStore) {
        if let Err(e) = self.medication_repo.save_all(schedule.entries()).await {
            error!(error = %e, "Failed to persist medication schedule");
        }
    }

    // Adherence

    /// Dose status of every entry without touching alert state.
    pub async fn status(&self, now: NaiveDateTime) -> ScheduleStatusResponse {
        let state = self.state.lock().await;
        let statuses = state.monitor.statuses(
            now,
            state.schedule.entries(),
            &state.mappings,
            state.discovery.observations(),
        );
        ScheduleStatusResponse {
            evaluated_at: now,
            statuses,
        }
    }

    /// Runs one evaluation, fills the alert slot and registers wrong-box notifications.
    pub async fn tick(&self, now: NaiveDateTime) -> Evaluation {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let evaluation = state.monitor.evaluate(
            now,
            state.schedule.entries(),
            &state.mappings,
            state.discovery.observations(),
        );
        for alert in &evaluation.alerts {
            counter!("adherence_alerts_total", "kind" => alert.kind.to_string()).increment(1);
            if let Some(replaced) = state.alert.raise(alert.clone()) {
                info!(
                    alert_id = %replaced.id,
                    kind = %replaced.kind,
                    "Unacknowledged alert replaced"
                );
            }
        }
        for event in &evaluation.wrong_box {
            self.reminders
                .schedule_wrong_box_alert(&event.entry, event.opened_box)
                .await;
        }
        evaluation
    }

    pub async fn current_alert(&self) -> Option<Alert> {
        self.state.lock().await.alert.current().cloned()
    }

    /// Clears the alert slot if it still holds `id`.
    pub async fn acknowledge_alert(&self, id: Uuid) -> bool {
        let acknowledged = self.state.lock().await.alert.acknowledge(id);
        if acknowledged {
            info!(alert_id = %id, "Alert acknowledged");
        }
        acknowledged
    }
}
