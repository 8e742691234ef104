//! Capability contract of a clustering marker layer.
//!
//! The engine never talks to a map library directly: the browser implements
//! `MarkerLayer` on top of Leaflet, the CLI and the tests use
//! `RecordingLayer`.

use crate::geo::{GeoBounds, LatLon};
use std::collections::BTreeMap;

/// Distance in pixels within which markers are clustered.
pub const CLUSTER_RADIUS: u32 = 30;

/// Cluster icon side in pixels.
pub const CLUSTER_ICON_SIZE: u32 = 40;

/// Handle of a marker owned by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    Normal,
    Current,
}

impl MarkerIcon {
    pub fn for_current(current: bool) -> Self {
        if current {
            MarkerIcon::Current
        } else {
            MarkerIcon::Normal
        }
    }

    /// Image name under the resource url; None means the library default.
    pub fn image(self) -> Option<&'static str> {
        match self {
            MarkerIcon::Normal => None,
            MarkerIcon::Current => Some("images/marker-selected-icon.png"),
        }
    }
}

/// Icon of a marker cluster.
///
/// A cluster holding at least one current marker is drawn as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterIcon {
    pub current: bool,
    pub count: usize,
}

impl ClusterIcon {
    pub fn new(any_current: bool, count: usize) -> Self {
        Self {
            current: any_current,
            count,
        }
    }

    pub fn from_children(children: impl IntoIterator<Item = MarkerIcon>) -> Self {
        let mut icon = ClusterIcon::new(false, 0);
        for child in children {
            icon.count += 1;
            icon.current |= child == MarkerIcon::Current;
        }
        icon
    }

    pub fn class_name(&self) -> &'static str {
        if self.current {
            "marker-cluster marker-cluster-current"
        } else {
            "marker-cluster marker-cluster-normal"
        }
    }

    pub fn html(&self) -> String {
        format!("<div><span>{}</span></div>", self.count)
    }
}

/// Operations the map sync controller needs from a clustering layer.
pub trait MarkerLayer {
    /// Drop the current cluster layer with all its markers and start a new,
    /// empty one.
    fn reset(&mut self);

    /// Create a marker and add it to the cluster layer.
    fn add_marker(&mut self, id: MarkerId, position: LatLon, title: &str, icon: MarkerIcon);

    /// Take a marker out of the cluster layer, keeping it for `restore_marker`.
    fn remove_marker(&mut self, id: MarkerId);

    fn set_icon(&mut self, id: MarkerId, icon: MarkerIcon);

    /// Put back a marker taken out with `remove_marker`.
    fn restore_marker(&mut self, id: MarkerId);

    /// Recompute the cluster icons.
    fn refresh_clusters(&mut self);

    fn fit_bounds(&mut self, bounds: GeoBounds);
}

/// A layer operation, as seen by `RecordingLayer`.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerOp {
    Reset,
    Add(MarkerId, MarkerIcon),
    Remove(MarkerId),
    SetIcon(MarkerId, MarkerIcon),
    Restore(MarkerId),
    RefreshClusters,
    FitBounds(GeoBounds),
}

#[derive(Debug, Clone)]
struct RecordedMarker {
    title: String,
    icon: MarkerIcon,
    attached: bool,
}

/// In-memory layer that records every operation.
#[derive(Debug, Clone, Default)]
pub struct RecordingLayer {
    ops: Vec<LayerOp>,
    markers: BTreeMap<MarkerId, RecordedMarker>,
    viewport: Option<GeoBounds>,
}

impl RecordingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[LayerOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<LayerOp> {
        std::mem::take(&mut self.ops)
    }

    /// Markers currently shown, with their titles and icons.
    pub fn visible(&self) -> Vec<(MarkerId, &str, MarkerIcon)> {
        self.markers
            .iter()
            .filter(|(_, m)| m.attached)
            .map(|(id, m)| (*id, m.title.as_str(), m.icon))
            .collect()
    }

    pub fn viewport(&self) -> Option<GeoBounds> {
        self.viewport
    }

    /// Icon of a single cluster holding every visible marker.
    pub fn cluster_icon(&self) -> ClusterIcon {
        ClusterIcon::from_children(self.visible().into_iter().map(|(_, _, icon)| icon))
    }
}

impl MarkerLayer for RecordingLayer {
    fn reset(&mut self) {
        self.markers.clear();
        self.ops.push(LayerOp::Reset);
    }

    fn add_marker(&mut self, id: MarkerId, _position: LatLon, title: &str, icon: MarkerIcon) {
        self.markers.insert(
            id,
            RecordedMarker {
                title: title.to_string(),
                icon,
                attached: true,
            },
        );
        self.ops.push(LayerOp::Add(id, icon));
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.attached = false;
        }
        self.ops.push(LayerOp::Remove(id));
    }

    fn set_icon(&mut self, id: MarkerId, icon: MarkerIcon) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.icon = icon;
        }
        self.ops.push(LayerOp::SetIcon(id, icon));
    }

    fn restore_marker(&mut self, id: MarkerId) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.attached = true;
        }
        self.ops.push(LayerOp::Restore(id));
    }

    fn refresh_clusters(&mut self) {
        self.ops.push(LayerOp::RefreshClusters);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.viewport = Some(bounds);
        self.ops.push(LayerOp::FitBounds(bounds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_icon_prefers_current() {
        let icon = ClusterIcon::from_children([MarkerIcon::Normal, MarkerIcon::Current, MarkerIcon::Normal]);
        assert!(icon.current);
        assert_eq!(icon.count, 3);
        assert_eq!(icon.class_name(), "marker-cluster marker-cluster-current");
        assert_eq!(icon.html(), "<div><span>3</span></div>");

        let normal = ClusterIcon::from_children([MarkerIcon::Normal; 2]);
        assert_eq!(normal.class_name(), "marker-cluster marker-cluster-normal");
    }

    #[test]
    fn test_recording_layer_tracks_visibility() {
        let mut layer = RecordingLayer::new();
        layer.add_marker(MarkerId(1), LatLon::new(45.0, 9.0), "a", MarkerIcon::Normal);
        layer.remove_marker(MarkerId(1));
        assert!(layer.visible().is_empty());
        layer.set_icon(MarkerId(1), MarkerIcon::Current);
        layer.restore_marker(MarkerId(1));
        assert_eq!(layer.visible(), vec![(MarkerId(1), "a", MarkerIcon::Current)]);
        assert_eq!(layer.ops().len(), 4);
    }
}
