//! Beacon-to-box mapping store.
//!
//! In-memory collection with the uniqueness rules enforced on every mutation.
//! Durability is the caller's concern: after each successful mutation the
//! full collection is written through to storage.

use std::collections::HashSet;

use tracing::{info, warn};

use shared::validation::box_in_range;

use crate::error::DomainError;
use crate::models::{AssignableBeacon, BeaconId, BeaconMapping, BeaconObservation};

#[derive(Debug, Clone)]
pub struct MappingStore {
    box_count: u8,
    mappings: Vec<BeaconMapping>,
}

impl MappingStore {
    pub fn new(box_count: u8) -> Self {
        Self {
            box_count,
            mappings: Vec::new(),
        }
    }

    /// Builds the store from persisted records.
    ///
    /// Records that break the uniqueness rules are kept (nothing the user
    /// stored is dropped) but reported, and lookups resolve to the first one.
    pub fn with_mappings(box_count: u8, mappings: Vec<BeaconMapping>) -> Self {
        let mut seen_boxes = HashSet::new();
        let mut seen_beacons = HashSet::new();
        for mapping in &mappings {
            if !seen_boxes.insert(mapping.box_number) || !seen_beacons.insert(&mapping.beacon_id) {
                warn!(
                    beacon_id = %mapping.beacon_id,
                    box_number = mapping.box_number,
                    "Persisted beacon mapping conflicts with an earlier one"
                );
            }
        }
        Self {
            box_count,
            mappings,
        }
    }

    pub fn box_count(&self) -> u8 {
        self.box_count
    }

    pub fn mappings(&self) -> &[BeaconMapping] {
        &self.mappings
    }

    /// Maps a beacon to a box.
    ///
    /// Rejects out-of-range boxes, boxes that already have a beacon, and
    /// beacons that already have a box.
    pub fn assign(
        &mut self,
        beacon_id: BeaconId,
        box_number: u8,
    ) -> Result<BeaconMapping, DomainError> {
        if !box_in_range(box_number, self.box_count) {
            return Err(DomainError::BoxOutOfRange {
                box_number,
                box_count: self.box_count,
            });
        }
        if let Some(existing) = self.box_for(&beacon_id) {
            return Err(DomainError::BeaconAlreadyMapped {
                beacon_id,
                box_number: existing,
            });
        }
        if let Some(owner) = self.beacon_for_box(box_number) {
            return Err(DomainError::BoxAlreadyAssigned {
                box_number,
                beacon_id: owner.clone(),
            });
        }

        let mapping = BeaconMapping {
            beacon_id,
            box_number,
        };
        info!(
            beacon_id = %mapping.beacon_id,
            box_number,
            "Beacon assigned to box"
        );
        self.mappings.push(mapping.clone());
        Ok(mapping)
    }

    /// Removes a beacon's mapping, freeing its box.
    pub fn unassign(&mut self, beacon_id: &BeaconId) -> Result<BeaconMapping, DomainError> {
        let index = self
            .mappings
            .iter()
            .position(|m| &m.beacon_id == beacon_id)
            .ok_or_else(|| DomainError::MappingNotFound(beacon_id.clone()))?;
        let removed = self.mappings.remove(index);
        info!(
            beacon_id = %removed.beacon_id,
            box_number = removed.box_number,
            "Beacon unassigned"
        );
        Ok(removed)
    }

    pub fn box_for(&self, beacon_id: &BeaconId) -> Option<u8> {
        self.mappings
            .iter()
            .find(|m| &m.beacon_id == beacon_id)
            .map(|m| m.box_number)
    }

    pub fn beacon_for_box(&self, box_number: u8) -> Option<&BeaconId> {
        self.mappings
            .iter()
            .find(|m| m.box_number == box_number)
            .map(|m| &m.beacon_id)
    }

    /// Boxes without a beacon. A beacon's own box stays in the list.
    pub fn available_boxes(&self, for_beacon: Option<&BeaconId>) -> Vec<u8> {
        (1..=self.box_count)
            .filter(|&b| match self.beacon_for_box(b) {
                None => true,
                Some(owner) => Some(owner) == for_beacon,
            })
            .collect()
    }

    /// Observed beacons without a mapping, in observation order.
    pub fn list_unmapped_beacons<'a>(
        &self,
        observed: &'a [BeaconObservation],
    ) -> Vec<&'a BeaconObservation> {
        observed
            .iter()
            .filter(|o| self.box_for(&o.beacon_id).is_none())
            .collect()
    }

    /// Unmapped beacons together with the boxes each may be assigned to.
    pub fn assignable_beacons(&self, observed: &[BeaconObservation]) -> Vec<AssignableBeacon> {
        let boxes = self.available_boxes(None);
        self.list_unmapped_beacons(observed)
            .into_iter()
            .map(|o| AssignableBeacon {
                beacon_id: o.beacon_id.clone(),
                label: o.display_label(),
                rssi: o.rssi,
                available_boxes: boxes.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observation(id: &str) -> BeaconObservation {
        BeaconObservation {
            beacon_id: BeaconId::new(id),
            name: crate::models::UNKNOWN_BEACON_NAME.to_string(),
            rssi: -40,
            sensor_byte: None,
            last_seen_at: Utc::now(),
        }
    }

    #[test]
    fn test_assign_and_lookup() {
        let mut store = MappingStore::new(10);
        let mapping = store.assign(BeaconId::new("B1"), 3).unwrap();
        assert_eq!(mapping.box_number, 3);
        assert_eq!(store.box_for(&BeaconId::new("B1")), Some(3));
        assert_eq!(store.beacon_for_box(3), Some(&BeaconId::new("B1")));
        assert_eq!(store.beacon_for_box(4), None);
    }

    #[test]
    fn test_assign_rejects_taken_box() {
        let mut store = MappingStore::new(10);
        store.assign(BeaconId::new("B1"), 3).unwrap();
        let err = store.assign(BeaconId::new("B2"), 3).unwrap_err();
        assert_eq!(
            err,
            DomainError::BoxAlreadyAssigned {
                box_number: 3,
                beacon_id: BeaconId::new("B1")
            }
        );
        assert_eq!(store.mappings().len(), 1);
    }

    #[test]
    fn test_assign_rejects_mapped_beacon() {
        let mut store = MappingStore::new(10);
        store.assign(BeaconId::new("B1"), 3).unwrap();
        let err = store.assign(BeaconId::new("B1"), 4).unwrap_err();
        assert!(matches!(err, DomainError::BeaconAlreadyMapped { box_number: 3, .. }));
    }

    #[test]
    fn test_assign_rejects_out_of_range() {
        let mut store = MappingStore::new(10);
        assert!(matches!(
            store.assign(BeaconId::new("B1"), 0),
            Err(DomainError::BoxOutOfRange { .. })
        ));
        assert!(matches!(
            store.assign(BeaconId::new("B1"), 11),
            Err(DomainError::BoxOutOfRange { .. })
        ));
    }

    #[test]
    fn test_unassign_frees_box() {
        let mut store = MappingStore::new(10);
        store.assign(BeaconId::new("B1"), 3).unwrap();
        store.unassign(&BeaconId::new("B1")).unwrap();
        assert!(store.available_boxes(None).contains(&3));
        store.assign(BeaconId::new("B2"), 3).unwrap();

        assert_eq!(
            store.unassign(&BeaconId::new("B1")),
            Err(DomainError::MappingNotFound(BeaconId::new("B1")))
        );
    }

    #[test]
    fn test_box_uniqueness_over_operation_sequence() {
        let mut store = MappingStore::new(4);
        let ops: Vec<(&str, u8, bool)> = vec![
            ("A", 1, true),
            ("B", 1, true),
            ("B", 2, true),
            ("A", 0, false),
            ("C", 2, true),
            ("C", 1, true),
            ("B", 0, false),
            ("D", 2, true),
            ("A", 3, true),
        ];
        for (id, box_number, assign) in ops {
            if assign {
                let _ = store.assign(BeaconId::new(id), box_number);
            } else {
                let _ = store.unassign(&BeaconId::new(id));
            }
            let boxes: HashSet<u8> = store.mappings().iter().map(|m| m.box_number).collect();
            assert_eq!(boxes.len(), store.mappings().len());
            let beacons: HashSet<&BeaconId> =
                store.mappings().iter().map(|m| &m.beacon_id).collect();
            assert_eq!(beacons.len(), store.mappings().len());
        }
    }

    #[test]
    fn test_available_boxes_keeps_own_box() {
        let mut store = MappingStore::new(5);
        store.assign(BeaconId::new("B1"), 2).unwrap();
        store.assign(BeaconId::new("B2"), 4).unwrap();
        assert_eq!(store.available_boxes(None), vec![1, 3, 5]);
        assert_eq!(
            store.available_boxes(Some(&BeaconId::new("B1"))),
            vec![1, 2, 3, 5]
        );
    }

    #[test]
    fn test_list_unmapped_beacons() {
        let mut store = MappingStore::new(10);
        store.assign(BeaconId::new("B1"), 1).unwrap();
        let observed = vec![observation("B1"), observation("B2"), observation("B3")];

        let unmapped: Vec<&str> = store
            .list_unmapped_beacons(&observed)
            .iter()
            .map(|o| o.beacon_id.as_str())
            .collect();
        assert_eq!(unmapped, vec!["B2", "B3"]);

        let assignable = store.assignable_beacons(&observed);
        assert_eq!(assignable.len(), 2);
        assert!(!assignable[0].available_boxes.contains(&1));
        assert_eq!(assignable[0].label, "B2");
    }

    #[test]
    fn test_assignable_beacon_uses_advertised_name() {
        use fake::faker::company::en::CompanyName;
        use fake::Fake;

        let store = MappingStore::new(3);
        let name: String = CompanyName().fake();
        let mut named = observation("0F3C1A2B-6D7E-4F80-9A1B-2C3D4E5F6071");
        named.name = name.clone();
        let unnamed = observation("9A8B7C6D-5E4F-4A3B-8C2D-1E0F9A8B7C6D");

        let assignable = store.assignable_beacons(&[named, unnamed]);
        assert_eq!(assignable[0].label, name);
        assert_eq!(assignable[1].label, "9A8B7C6D");
        assert_eq!(assignable[1].available_boxes, vec![1, 2, 3]);
    }

    #[test]
    fn test_with_mappings_keeps_conflicting_records() {
        let store = MappingStore::with_mappings(
            10,
            vec![
                BeaconMapping {
                    beacon_id: BeaconId::new("B1"),
                    box_number: 1,
                },
                BeaconMapping {
                    beacon_id: BeaconId::new("B2"),
                    box_number: 1,
                },
            ],
        );
        assert_eq!(store.mappings().len(), 2);
        assert_eq!(store.beacon_for_box(1), Some(&BeaconId::new("B1")));
    }
}
