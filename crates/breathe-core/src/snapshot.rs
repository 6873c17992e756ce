//! The engine's externally visible state.

use std::collections::HashSet;

use breathe_types::{Reading, Zone};

use crate::prefs::PinSet;

/// A complete, internally consistent view of synchronized state.
///
/// Snapshots are values: the engine replaces the published snapshot as a
/// whole, never field by field. Pinned readings are always derived from
/// `all_readings` and `pinned_ids` on access, so the two can never disagree.
///
/// Every reading belongs to a zone of the current catalog, and there is at
/// most one reading per zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSnapshot {
    zones: Vec<Zone>,
    readings: Vec<Reading>,
    pinned_ids: PinSet,
    is_loading: bool,
    error: Option<String>,
}

impl SyncSnapshot {
    /// Build a snapshot, dropping readings for unknown zones and duplicates.
    pub fn new(zones: Vec<Zone>, readings: Vec<Reading>, pinned_ids: PinSet) -> Self {
        let mut snapshot = Self {
            zones,
            readings: Vec::new(),
            pinned_ids,
            is_loading: false,
            error: None,
        };
        snapshot.set_readings(readings);
        snapshot
    }

    /// Zones of the last catalog, in service order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Every reading of the last merge.
    pub fn all_readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Readings of pinned zones, in `all_readings` order.
    pub fn pinned_readings(&self) -> Vec<&Reading> {
        self.readings
            .iter()
            .filter(|r| self.pinned_ids.contains(&r.zone_id))
            .collect()
    }

    pub fn pinned_ids(&self) -> &PinSet {
        &self.pinned_ids
    }

    pub fn is_pinned(&self, zone_id: &str) -> bool {
        self.pinned_ids.contains(zone_id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message of the last failed foreground catalog fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether any reading is available.
    pub fn has_data(&self) -> bool {
        !self.readings.is_empty()
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    pub fn reading(&self, zone_id: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.zone_id == zone_id)
    }

    /// Zones whose name or id contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&Zone> {
        self.zones.iter().filter(|z| z.matches(query)).collect()
    }

    /// Replace the catalog; readings of zones that disappeared are dropped.
    pub(crate) fn set_zones(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        let readings = std::mem::take(&mut self.readings);
        self.set_readings(readings);
    }

    /// Replace all readings, keeping only the first per catalogued zone.
    pub(crate) fn set_readings(&mut self, readings: Vec<Reading>) {
        let known: HashSet<&str> = self.zones.iter().map(|z| z.id.as_str()).collect();
        let mut seen = HashSet::new();
        self.readings = readings
            .into_iter()
            .filter(|r| known.contains(r.zone_id.as_str()) && seen.insert(r.zone_id.clone()))
            .collect();
    }

    /// Flip a pin, returning whether the zone is now pinned.
    pub(crate) fn toggle_pin(&mut self, zone_id: &str) -> bool {
        self.pinned_ids.toggle(zone_id)
    }

    pub(crate) fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zones(ids: &[&str]) -> Vec<Zone> {
        ids.iter().map(|id| Zone::new(*id, id.to_uppercase())).collect()
    }

    fn pinned_matches_filter(snapshot: &SyncSnapshot) -> bool {
        let expected: Vec<&Reading> = snapshot
            .all_readings()
            .iter()
            .filter(|r| snapshot.pinned_ids().contains(&r.zone_id))
            .collect();
        snapshot.pinned_readings() == expected
    }

    #[test]
    fn test_unknown_zone_readings_are_dropped() {
        let snapshot = SyncSnapshot::new(
            zones(&["a", "b"]),
            vec![Reading::new("a", 1), Reading::new("ghost", 2)],
            PinSet::new(),
        );
        assert_eq!(snapshot.all_readings().len(), 1);
        assert!(snapshot.reading("ghost").is_none());
    }

    #[test]
    fn test_duplicate_readings_keep_first() {
        let snapshot = SyncSnapshot::new(
            zones(&["a"]),
            vec![Reading::new("a", 1), Reading::new("a", 2)],
            PinSet::new(),
        );
        assert_eq!(snapshot.all_readings().len(), 1);
        assert_eq!(snapshot.reading("a").unwrap().index_value, 1);
    }

    #[test]
    fn test_pinned_readings_are_derived() {
        let mut snapshot = SyncSnapshot::new(
            zones(&["a", "b", "c"]),
            vec![Reading::new("a", 1), Reading::new("c", 3)],
            ["a", "b"].into_iter().collect(),
        );
        let pinned: Vec<_> = snapshot.pinned_readings().iter().map(|r| r.zone_id.as_str()).collect();
        assert_eq!(pinned, vec!["a"]);

        snapshot.toggle_pin("c");
        assert_eq!(snapshot.pinned_readings().len(), 2);
        assert!(pinned_matches_filter(&snapshot));
    }

    #[test]
    fn test_catalog_shrink_drops_readings() {
        let mut snapshot = SyncSnapshot::new(
            zones(&["a", "b"]),
            vec![Reading::new("a", 1), Reading::new("b", 2)],
            PinSet::new(),
        );
        snapshot.set_zones(zones(&["b"]));
        assert_eq!(snapshot.all_readings().len(), 1);
        assert_eq!(snapshot.all_readings()[0].zone_id, "b");
    }

    #[test]
    fn test_search() {
        let snapshot = SyncSnapshot::new(
            vec![Zone::new("srinagar", "Srinagar"), Zone::new("jammu", "Jammu")],
            Vec::new(),
            PinSet::new(),
        );
        assert_eq!(snapshot.search("").len(), 2);
        assert_eq!(snapshot.search("SRI")[0].id, "srinagar");
        assert!(snapshot.search("delhi").is_empty());
    }

    proptest! {
        #[test]
        fn prop_pinned_readings_track_toggles(
            toggles in proptest::collection::vec(0usize..6, 0..40),
            present in proptest::collection::vec(any::<bool>(), 6),
        ) {
            let ids = ["a", "b", "c", "d", "e", "f"];
            let readings = ids
                .iter()
                .zip(&present)
                .filter(|(_, p)| **p)
                .map(|(id, _)| Reading::new(*id, 1))
                .collect();
            let mut snapshot = SyncSnapshot::new(zones(&ids), readings, PinSet::new());

            for i in toggles {
                snapshot.toggle_pin(ids[i]);
                prop_assert!(pinned_matches_filter(&snapshot));
            }
        }

        #[test]
        fn prop_double_toggle_restores(pins in proptest::collection::btree_set("[a-f]", 0..6), id in "[a-h]") {
            let mut snapshot = SyncSnapshot::new(
                zones(&["a", "b", "c", "d", "e", "f"]),
                vec![Reading::new("a", 1), Reading::new("d", 2)],
                pins.into_iter().collect(),
            );
            let before = snapshot.clone();
            snapshot.toggle_pin(&id);
            snapshot.toggle_pin(&id);
            prop_assert_eq!(snapshot, before);
        }
    }
}
