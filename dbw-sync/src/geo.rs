//! Geographic points and bounding boxes.

use dbw_utils::coords::round_coord;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Smallest rectangle containing every point, or None if there are none.
    pub fn from_points(points: impl IntoIterator<Item = LatLon>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = GeoBounds::new(first.lat, first.lon, first.lat, first.lon);
        for p in iter {
            bounds.south = bounds.south.min(p.lat);
            bounds.north = bounds.north.max(p.lat);
            bounds.west = bounds.west.min(p.lon);
            bounds.east = bounds.east.max(p.lon);
        }
        Some(bounds)
    }

    /// Corners rounded to the filter precision.
    pub fn rounded(self) -> Self {
        GeoBounds::new(
            round_coord(self.south),
            round_coord(self.west),
            round_coord(self.north),
            round_coord(self.east),
        )
    }

    /// The bounds as filter pairs, in `latmin latmax lonmin lonmax` order.
    pub fn filter_pairs(self) -> [(&'static str, Value); 4] {
        [
            ("latmin", Value::from(self.south)),
            ("latmax", Value::from(self.north)),
            ("lonmin", Value::from(self.west)),
            ("lonmax", Value::from(self.east)),
        ]
    }
}
