//! Identity-keyed station store.
//!
//! Stations are created the first time they show up in a snapshot, either
//! among the matching stations or among the ones excluded by the filter.
//! After that only their `current` flag and marker reference change.

use crate::geo::LatLon;
use crate::layer::MarkerId;
use dbw_api::{StationId, StationRecord};
use dbw_utils::coords::{from_units, to_units};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Identity of a station: report, id, canonical coordinates and mobile
/// identifier.
///
/// Coordinates are kept as integer units of 1e-5 degrees, so the same
/// station always maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationKey {
    pub report: String,
    pub id: StationId,
    lat_units: i64,
    lon_units: i64,
    pub ident: Option<String>,
}

impl StationKey {
    pub fn new(report: impl Into<String>, id: StationId, lat: f64, lon: f64, ident: Option<String>) -> Self {
        Self {
            report: report.into(),
            id,
            lat_units: to_units(lat),
            lon_units: to_units(lon),
            ident,
        }
    }

    pub fn from_record(record: &StationRecord) -> Self {
        Self::new(
            record.report.clone(),
            record.id,
            record.lat,
            record.lon,
            record.ident.clone(),
        )
    }

    pub fn lat(&self) -> f64 {
        from_units(self.lat_units)
    }

    pub fn lon(&self) -> f64 {
        from_units(self.lon_units)
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat(), self.lon())
    }

    pub fn is_mobile(&self) -> bool {
        self.ident.is_some()
    }

    /// Display title: the identifier for mobile stations, the coordinates
    /// otherwise.
    pub fn title(&self) -> String {
        match &self.ident {
            Some(ident) => format!("{} ({})", ident, self.report),
            None => format!("{:.2},{:.2} ({})", self.lat(), self.lon(), self.report),
        }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.report,
            self.id,
            self.lat(),
            self.lon(),
            self.ident.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    key: StationKey,
    title: String,
    pub current: bool,
    pub marker: Option<MarkerId>,
    last_seen: u64,
}

impl Station {
    fn new(key: StationKey, current: bool, generation: u64) -> Self {
        Self {
            title: key.title(),
            key,
            current,
            marker: None,
            last_seen: generation,
        }
    }

    pub fn key(&self) -> &StationKey {
        &self.key
    }

    pub fn id(&self) -> StationId {
        self.key.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn position(&self) -> LatLon {
        self.key.position()
    }
}

/// How the `current` flag of a station is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Current means "matches the active filter".
    Membership,
    /// Current means "is the station being shown in detail".
    Single { current_id: Option<StationId> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Drop stations not seen in this many reconciliations. None keeps every
    /// station for the whole session.
    pub retention: Option<u32>,
}

/// Outcome of a reconciliation, as station keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub created: Vec<StationKey>,
    pub updated: Vec<StationKey>,
    pub removed: Vec<StationKey>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StationStore {
    stations: BTreeMap<StationKey, Station>,
    tracking: Tracking,
    config: StoreConfig,
    generation: u64,
}

impl StationStore {
    pub fn new(tracking: Tracking, config: StoreConfig) -> Self {
        Self {
            stations: BTreeMap::new(),
            tracking,
            config,
            generation: 0,
        }
    }

    pub fn membership() -> Self {
        Self::new(Tracking::Membership, StoreConfig::default())
    }

    pub fn single() -> Self {
        Self::new(Tracking::Single { current_id: None }, StoreConfig::default())
    }

    pub fn tracking(&self) -> Tracking {
        self.tracking
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, key: &StationKey) -> Option<&Station> {
        self.stations.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Station> {
        self.stations.values_mut()
    }

    pub fn current(&self) -> impl Iterator<Item = &Station> {
        self.stations.values().filter(|s| s.current)
    }

    fn wanted(&self, record: &StationRecord, matching: bool) -> bool {
        match self.tracking {
            Tracking::Membership => matching,
            Tracking::Single { current_id } => current_id == Some(record.id),
        }
    }

    fn mark(&mut self, key: StationKey, current: bool, diff: &mut Reconciliation, seen: &mut HashSet<StationKey>) {
        let generation = self.generation;
        match self.stations.get_mut(&key) {
            Some(station) => {
                station.last_seen = generation;
                if station.current != current {
                    station.current = current;
                    if seen.insert(key.clone()) {
                        diff.updated.push(key);
                    }
                }
            }
            None => {
                self.stations
                    .insert(key.clone(), Station::new(key.clone(), current, generation));
                seen.insert(key.clone());
                diff.created.push(key);
            }
        }
    }

    /// Bring the store in line with a snapshot's matching and excluded
    /// stations.
    ///
    /// A station listed in both is a dataset inconsistency: it is logged and
    /// the excluded list, processed last, decides its flag.
    pub fn reconcile(&mut self, matching: &[StationRecord], disabled: &[StationRecord]) -> Reconciliation {
        self.generation += 1;
        let mut diff = Reconciliation::default();

        // Keys already listed in `diff` during this pass
        let mut seen = HashSet::new();
        let mut matched = HashSet::new();
        for record in matching {
            let key = StationKey::from_record(record);
            matched.insert(key.clone());
            let current = self.wanted(record, true);
            self.mark(key, current, &mut diff, &mut seen);
        }
        for record in disabled {
            let key = StationKey::from_record(record);
            if matched.contains(&key) {
                warn!("Station {} is both matching and excluded by the filter", key);
            }
            let current = self.wanted(record, false);
            self.mark(key, current, &mut diff, &mut seen);
        }

        self.prune(&mut diff);
        debug!(
            "Stations reconciled: {} created, {} updated, {} removed, {} known",
            diff.created.len(),
            diff.updated.len(),
            diff.removed.len(),
            self.stations.len()
        );
        diff
    }

    fn prune(&mut self, diff: &mut Reconciliation) {
        let Some(retention) = self.config.retention else {
            return;
        };
        let horizon = self.generation.saturating_sub(u64::from(retention.max(1)));
        let stale: Vec<StationKey> = self
            .stations
            .values()
            .filter(|s| s.last_seen <= horizon)
            .map(|s| s.key.clone())
            .collect();
        if stale.is_empty() {
            return;
        }
        let stale_keys: HashSet<&StationKey> = stale.iter().collect();
        diff.updated.retain(|k| !stale_keys.contains(k));
        for key in &stale {
            self.stations.remove(key);
        }
        diff.removed.extend(stale);
    }

    /// Make `station_id` the only current station.
    ///
    /// Switches the store to single-station tracking. Returns only the
    /// stations whose flag changed.
    pub fn set_current(&mut self, station_id: Option<StationId>) -> Vec<StationKey> {
        self.tracking = Tracking::Single {
            current_id: station_id,
        };
        let mut updated = Vec::new();
        for station in self.stations.values_mut() {
            let is_current = station_id == Some(station.key.id);
            if station.current != is_current {
                station.current = is_current;
                updated.push(station.key.clone());
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(report: &str, id: StationId, lat: f64, lon: f64) -> StationRecord {
        StationRecord {
            report: report.to_string(),
            id,
            lat,
            lon,
            ident: None,
        }
    }

    #[test]
    fn test_reconcile_matching_and_disabled() {
        let mut store = StationStore::membership();
        let diff = store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[rec("synop", 2, 46.0, 10.0)]);
        let k1 = StationKey::new("synop", 1, 45.0, 9.0, None);
        let k2 = StationKey::new("synop", 2, 46.0, 10.0, None);
        assert_eq!(diff.created, vec![k1.clone(), k2.clone()]);
        assert!(diff.updated.is_empty());
        assert_eq!(store.len(), 2);
        assert!(store.get(&k1).unwrap().current);
        assert!(!store.get(&k2).unwrap().current);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut store = StationStore::membership();
        let matching = vec![rec("synop", 1, 45.0, 9.0), rec("temp", 3, 44.0, 8.0)];
        let disabled = vec![rec("synop", 2, 46.0, 10.0)];
        store.reconcile(&matching, &disabled);
        let second = store.reconcile(&matching, &disabled);
        assert!(second.created.is_empty());
        assert!(second.updated.is_empty());
    }

    #[test]
    fn test_flipping_many_stations_lists_each_once() {
        let records: Vec<StationRecord> = (0..5000)
            .map(|i| rec("synop", i, 40.0 + (i as f64) * 1e-3, 9.0))
            .collect();
        let mut store = StationStore::membership();
        assert_eq!(store.reconcile(&records, &[]).created.len(), 5000);

        let diff = store.reconcile(&[], &records);
        assert!(diff.created.is_empty());
        assert_eq!(diff.updated.len(), 5000);
        let unique: HashSet<&StationKey> = diff.updated.iter().collect();
        assert_eq!(unique.len(), 5000);
        assert_eq!(store.current().count(), 0);
    }

    #[test]
    fn test_station_moving_to_disabled_is_updated() {
        let mut store = StationStore::membership();
        store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[]);
        let diff = store.reconcile(&[], &[rec("synop", 1, 45.0, 9.0)]);
        let key = StationKey::new("synop", 1, 45.0, 9.0, None);
        assert_eq!(diff.updated, vec![key.clone()]);
        assert!(!store.get(&key).unwrap().current);
    }

    #[test]
    fn test_store_is_append_only() {
        let mut store = StationStore::membership();
        store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[rec("synop", 2, 46.0, 10.0)]);
        let diff = store.reconcile(&[rec("synop", 3, 47.0, 11.0)], &[]);
        assert_eq!(diff.created.len(), 1);
        assert!(diff.removed.is_empty());
        assert_eq!(store.len(), 3);
        // Listing a known station again never duplicates it
        store.reconcile(&[rec("synop", 1, 45.0, 9.0), rec("synop", 1, 45.0, 9.0)], &[]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_coordinates_are_canonical() {
        let mut store = StationStore::membership();
        store.reconcile(&[rec("synop", 1, 0.1 + 0.2, 9.0)], &[]);
        let diff = store.reconcile(&[rec("synop", 1, 0.3, 9.0)], &[]);
        assert!(diff.created.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_in_both_lists_last_pass_wins() {
        let mut store = StationStore::membership();
        let diff = store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[rec("synop", 1, 45.0, 9.0)]);
        assert_eq!(diff.created.len(), 1);
        assert!(diff.updated.is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.current().count(), 0);
    }

    #[test]
    fn test_set_current_twice_is_noop() {
        let mut store = StationStore::single();
        store.reconcile(&[rec("synop", 1, 45.0, 9.0), rec("synop", 2, 46.0, 10.0)], &[]);
        assert_eq!(store.current().count(), 0);
        assert_eq!(store.set_current(Some(1)).len(), 1);
        assert!(store.set_current(Some(1)).is_empty());
        let switched = store.set_current(Some(2));
        assert_eq!(switched.len(), 2);
        assert_eq!(store.current().map(|s| s.id()).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_single_tracking_reconcile_uses_current_id() {
        let mut store = StationStore::single();
        store.set_current(Some(2));
        let diff = store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[rec("synop", 2, 46.0, 10.0)]);
        assert_eq!(diff.created.len(), 2);
        assert_eq!(store.current().map(|s| s.id()).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_retention_prunes_unseen_stations() {
        let mut store = StationStore::new(Tracking::Membership, StoreConfig { retention: Some(2) });
        store.reconcile(&[rec("synop", 1, 45.0, 9.0), rec("synop", 2, 46.0, 10.0)], &[]);
        let diff = store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[]);
        assert!(diff.removed.is_empty());
        let diff = store.reconcile(&[rec("synop", 1, 45.0, 9.0)], &[]);
        assert_eq!(diff.removed, vec![StationKey::new("synop", 2, 46.0, 10.0, None)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_titles() {
        let fixed = StationKey::new("synop", 1, 45.123, 9.5, None);
        assert_eq!(fixed.title(), "45.12,9.50 (synop)");
        let mobile = StationKey::new("ship", 7, 44.5, 11.25, Some("ABCD".to_string()));
        assert_eq!(mobile.title(), "ABCD (ship)");
        assert!(mobile.is_mobile());
    }
}
