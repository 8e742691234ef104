//! Keeps a marker layer in line with a station store.

use crate::bus::{EventBus, Intent};
use crate::geo::GeoBounds;
use crate::layer::{MarkerIcon, MarkerId, MarkerLayer};
use crate::station::{Reconciliation, Station, StationKey, StationStore};
use dbw_api::{StationId, StationRecord};
use log::debug;
use std::collections::HashMap;

/// What a sync did to the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// The cluster layer was rebuilt with every known station.
    Relayout,
    /// Only the changed markers got a new icon.
    Reicon,
    Unchanged,
}

/// Owns a station store and the marker layer showing it.
pub struct MapSyncController<L> {
    layer: L,
    store: StationStore,
    markers: HashMap<MarkerId, StationKey>,
    next_marker: u64,
    needs_fit: bool,
}

impl<L: MarkerLayer> MapSyncController<L> {
    pub fn new(layer: L, store: StationStore) -> Self {
        Self {
            layer,
            store,
            markers: HashMap::new(),
            next_marker: 0,
            needs_fit: true,
        }
    }

    pub fn store(&self) -> &StationStore {
        &self.store
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }

    pub fn needs_fit(&self) -> bool {
        self.needs_fit
    }

    /// Fit the viewport again on the next sync.
    pub fn request_fit(&mut self) {
        self.needs_fit = true;
    }

    /// Reconcile the store with a snapshot's stations and update the layer.
    pub fn update_stations(&mut self, matching: &[StationRecord], disabled: &[StationRecord]) -> SyncAction {
        let diff = self.store.reconcile(matching, disabled);
        self.sync(&diff)
    }

    /// Highlight one station and zoom on it.
    pub fn focus_station(&mut self, station_id: Option<StationId>) -> SyncAction {
        let updated = self.store.set_current(station_id);
        self.request_fit();
        self.sync(&Reconciliation {
            updated,
            ..Default::default()
        })
    }

    /// Apply a store diff to the layer.
    pub fn sync(&mut self, diff: &Reconciliation) -> SyncAction {
        let action = if !diff.created.is_empty() || !diff.removed.is_empty() {
            self.relayout();
            SyncAction::Relayout
        } else if !diff.updated.is_empty() {
            self.reicon(&diff.updated)
        } else {
            SyncAction::Unchanged
        };
        if self.needs_fit {
            self.fit();
        }
        action
    }

    fn relayout(&mut self) {
        self.layer.reset();
        self.markers.clear();
        for station in self.store.iter_mut() {
            let id = MarkerId(self.next_marker);
            self.next_marker += 1;
            self.layer.add_marker(
                id,
                station.position(),
                station.title(),
                MarkerIcon::for_current(station.current),
            );
            station.marker = Some(id);
            self.markers.insert(id, station.key().clone());
        }
        debug!("Marker layer rebuilt with {} stations", self.markers.len());
    }

    fn reicon(&mut self, updated: &[StationKey]) -> SyncAction {
        // A station without a marker was never laid out
        if updated
            .iter()
            .any(|key| self.store.get(key).is_some_and(|s| s.marker.is_none()))
        {
            self.relayout();
            return SyncAction::Relayout;
        }
        for key in updated {
            let Some(station) = self.store.get(key) else {
                continue;
            };
            let Some(marker) = station.marker else {
                continue;
            };
            self.layer.remove_marker(marker);
            self.layer.set_icon(marker, MarkerIcon::for_current(station.current));
            self.layer.restore_marker(marker);
        }
        self.layer.refresh_clusters();
        debug!("Re-iconed {} markers", updated.len());
        SyncAction::Reicon
    }

    fn fit(&mut self) {
        let bounds = GeoBounds::from_points(self.store.current().map(Station::position))
            .or_else(|| GeoBounds::from_points(self.store.iter().map(Station::position)));
        if let Some(bounds) = bounds {
            self.layer.fit_bounds(bounds);
            self.needs_fit = false;
        }
    }

    /// Report a marker click as a station selection.
    pub fn marker_clicked(&self, marker: MarkerId, bus: &mut EventBus) {
        match self.markers.get(&marker) {
            Some(key) => bus.emit(Intent::StationSelected(key.clone())),
            None => debug!("Click on unknown marker {:?}", marker),
        }
    }

    /// Report a rectangle drawn on the map.
    pub fn bounds_selected(&self, bounds: GeoBounds, finished: bool, bus: &mut EventBus) {
        bus.emit(Intent::BoundsSelected { bounds, finished });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerOp, RecordingLayer};
    use crate::station::{StoreConfig, Tracking};

    fn rec(id: StationId, lat: f64, lon: f64) -> StationRecord {
        StationRecord {
            report: "synop".to_string(),
            id,
            lat,
            lon,
            ident: None,
        }
    }

    fn controller() -> MapSyncController<RecordingLayer> {
        MapSyncController::new(RecordingLayer::new(), StationStore::membership())
    }

    #[test]
    fn test_created_stations_trigger_relayout_and_fit() {
        let mut map = controller();
        let action = map.update_stations(&[rec(1, 45.0, 9.0)], &[rec(2, 46.0, 10.0)]);
        assert_eq!(action, SyncAction::Relayout);
        let ops = map.layer_mut().take_ops();
        assert_eq!(ops[0], LayerOp::Reset);
        assert_eq!(ops.iter().filter(|op| matches!(op, LayerOp::Add(..))).count(), 2);
        // Only the current station is fitted
        assert_eq!(
            map.layer().viewport(),
            Some(GeoBounds::new(45.0, 9.0, 45.0, 9.0))
        );
        assert!(!map.needs_fit());
        assert!(map.layer().cluster_icon().current);
    }

    #[test]
    fn test_growth_rebuilds_every_marker() {
        let mut map = controller();
        map.update_stations(&[rec(1, 45.0, 9.0)], &[]);
        map.layer_mut().take_ops();
        map.update_stations(&[rec(1, 45.0, 9.0), rec(3, 44.0, 8.0)], &[]);
        let ops = map.layer_mut().take_ops();
        assert_eq!(ops.iter().filter(|op| matches!(op, LayerOp::Add(..))).count(), 2);
        assert_eq!(map.layer().visible().len(), 2);
    }

    #[test]
    fn test_updates_are_reiconed_in_one_batch() {
        let mut map = controller();
        map.update_stations(&[rec(1, 45.0, 9.0), rec(2, 46.0, 10.0)], &[]);
        map.layer_mut().take_ops();
        let action = map.update_stations(&[], &[rec(1, 45.0, 9.0), rec(2, 46.0, 10.0)]);
        assert_eq!(action, SyncAction::Reicon);
        let ops = map.layer_mut().take_ops();
        assert!(!ops.contains(&LayerOp::Reset));
        assert_eq!(ops.iter().filter(|op| **op == LayerOp::RefreshClusters).count(), 1);
        assert_eq!(ops.last(), Some(&LayerOp::RefreshClusters));
        assert_eq!(ops.len(), 7);
        assert!(!map.layer().cluster_icon().current);
    }

    #[test]
    fn test_unchanged_snapshot_touches_nothing() {
        let mut map = controller();
        map.update_stations(&[rec(1, 45.0, 9.0)], &[]);
        map.layer_mut().take_ops();
        assert_eq!(map.update_stations(&[rec(1, 45.0, 9.0)], &[]), SyncAction::Unchanged);
        assert!(map.layer().ops().is_empty());
    }

    #[test]
    fn test_fit_falls_back_to_all_stations_then_defers() {
        let mut map = controller();
        map.update_stations(&[], &[]);
        assert!(map.needs_fit());
        map.update_stations(&[], &[rec(1, 45.0, 9.0), rec(2, 46.0, 10.0)]);
        assert_eq!(
            map.layer().viewport(),
            Some(GeoBounds::new(45.0, 9.0, 46.0, 10.0))
        );
        assert!(!map.needs_fit());
    }

    #[test]
    fn test_focus_station_reicons_and_refits() {
        let mut map = MapSyncController::new(
            RecordingLayer::new(),
            StationStore::new(Tracking::Single { current_id: None }, StoreConfig::default()),
        );
        map.update_stations(&[rec(1, 45.0, 9.0), rec(2, 46.0, 10.0)], &[]);
        map.layer_mut().take_ops();
        assert_eq!(map.focus_station(Some(2)), SyncAction::Reicon);
        assert_eq!(
            map.layer().viewport(),
            Some(GeoBounds::new(46.0, 10.0, 46.0, 10.0))
        );
        assert_eq!(map.focus_station(Some(2)), SyncAction::Unchanged);
    }

    #[test]
    fn test_marker_click_emits_station_selected() {
        let mut map = controller();
        map.update_stations(&[rec(1, 45.0, 9.0)], &[]);
        let (marker, _, _) = map.layer().visible()[0];
        let mut bus = EventBus::new();
        map.marker_clicked(marker, &mut bus);
        map.marker_clicked(MarkerId(999), &mut bus);
        let intents = bus.drain();
        assert_eq!(intents.len(), 1);
        match &intents[0] {
            Intent::StationSelected(key) => assert_eq!(key.id, 1),
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_pruning_forces_relayout() {
        let mut map = MapSyncController::new(
            RecordingLayer::new(),
            StationStore::new(Tracking::Membership, StoreConfig { retention: Some(1) }),
        );
        map.update_stations(&[rec(1, 45.0, 9.0), rec(2, 46.0, 10.0)], &[]);
        assert_eq!(map.update_stations(&[rec(1, 45.0, 9.0)], &[]), SyncAction::Relayout);
        assert_eq!(map.layer().visible().len(), 1);
    }
}
