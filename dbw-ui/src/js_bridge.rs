//! Typed wrappers around the Leaflet bridge in `assets/js/leaflet-layer.js`.
//!
//! The script is evaluated at global scope once Leaflet and the
//! markercluster plugin are loaded. Calls made before that are queued on
//! `window.__dbwPending` and replayed in order.

use dbw_sync::layer::{CLUSTER_ICON_SIZE, CLUSTER_RADIUS};
use dbw_sync::{ClusterIcon, GeoBounds, LatLon, MarkerIcon, MarkerId, MarkerLayer};
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

static LEAFLET_LAYER_JS: &str = include_str!("../assets/js/leaflet-layer.js");

/// Execute arbitrary JS, wrapping in try/catch to avoid panics.
pub fn call_js(code: &str) {
    let wrapped = format!(
        "try {{ {} }} catch(e) {{ console.warn('DBW JS call failed:', e); }}",
        code
    );
    let _ = js_sys::eval(&wrapped);
}

/// Load the Leaflet bridge with a wait-for-Leaflet polling loop. Call once at app startup.
pub fn init_maps() {
    let store_js = format!(
        "window.__dbwMapScripts = {};",
        serde_json::to_string(LEAFLET_LAYER_JS).unwrap_or_default()
    );
    let _ = js_sys::eval(&store_js);

    let init_js = r#"
        (function() {
            window.__dbwPending = window.__dbwPending || [];
            var waitForLeaflet = setInterval(function() {
                if (typeof L !== 'undefined' && typeof L.markerClusterGroup !== 'undefined') {
                    clearInterval(waitForLeaflet);
                    (0, eval)(window.__dbwMapScripts);
                    delete window.__dbwMapScripts;
                    if (typeof dbwInitMap !== 'undefined') window.dbwInitMap = dbwInitMap;
                    if (typeof dbwResetLayer !== 'undefined') window.dbwResetLayer = dbwResetLayer;
                    if (typeof dbwAddMarker !== 'undefined') window.dbwAddMarker = dbwAddMarker;
                    if (typeof dbwRemoveMarker !== 'undefined') window.dbwRemoveMarker = dbwRemoveMarker;
                    if (typeof dbwSetIcon !== 'undefined') window.dbwSetIcon = dbwSetIcon;
                    if (typeof dbwRestoreMarker !== 'undefined') window.dbwRestoreMarker = dbwRestoreMarker;
                    if (typeof dbwRefreshClusters !== 'undefined') window.dbwRefreshClusters = dbwRefreshClusters;
                    if (typeof dbwFitBounds !== 'undefined') window.dbwFitBounds = dbwFitBounds;
                    window.__dbwMapsReady = true;
                    var pending = window.__dbwPending;
                    window.__dbwPending = [];
                    for (var i = 0; i < pending.length; ++i) {
                        try { pending[i](); } catch(e) { console.error('[DBW] map call error:', e); }
                    }
                    console.log('DBW maps initialized');
                }
            }, 100);
        })();
    "#;
    let _ = js_sys::eval(init_js);
}

/// Call a bridge function now if the scripts are loaded, later otherwise.
fn call_bridge(function: &str, args: &[Value]) {
    let args = args
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    call_js(&format!(
        r#"
        (function() {{
            var call = function() {{ window.{function}({args}); }};
            if (window.__dbwMapsReady) {{ call(); }}
            else {{ (window.__dbwPending = window.__dbwPending || []).push(call); }}
        }})();
        "#,
    ));
}

/// Create the Leaflet map once its container exists.
///
/// Uses a polling loop to wait for the bridge scripts and the container DOM
/// element. Markers added before the map exists are attached when it appears.
pub fn create_map(map_id: &str, box_select: bool) {
    call_js(&format!(
        r#"
        (function() {{
            var poll = setInterval(function() {{
                if (window.__dbwMapsReady &&
                    typeof window.dbwInitMap !== 'undefined' &&
                    document.getElementById({id})) {{
                    clearInterval(poll);
                    try {{
                        window.dbwInitMap({id}, {box_select});
                    }} catch(e) {{ console.error('[DBW] dbwInitMap error:', e); }}
                }}
            }}, 100);
        }})();
        "#,
        id = json!(map_id),
    ));
}

/// Marker layer of one Leaflet map, addressed by its container id.
pub struct LeafletLayer {
    map_id: String,
    resource_url: String,
}

impl LeafletLayer {
    /// `resource_url` is the base url of the marker images.
    pub fn new(map_id: &str, resource_url: &str) -> Self {
        Self {
            map_id: map_id.to_string(),
            resource_url: resource_url.to_string(),
        }
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    /// Image url for `icon`, or null for Leaflet's default marker.
    fn icon_url(&self, icon: MarkerIcon) -> Value {
        match icon.image() {
            Some(image) => json!(format!("{}{}", self.resource_url, image)),
            None => Value::Null,
        }
    }

    /// Clustering parameters passed along with every layer reset.
    fn cluster_args() -> Vec<Value> {
        vec![json!(CLUSTER_RADIUS), json!(CLUSTER_ICON_SIZE)]
    }

    fn call(&self, function: &str, mut args: Vec<Value>) {
        args.insert(0, json!(self.map_id));
        call_bridge(function, &args);
    }
}

impl MarkerLayer for LeafletLayer {
    fn reset(&mut self) {
        self.call("dbwResetLayer", Self::cluster_args());
    }

    fn add_marker(&mut self, id: MarkerId, position: LatLon, title: &str, icon: MarkerIcon) {
        self.call(
            "dbwAddMarker",
            vec![
                json!(id.0),
                json!(position.lat),
                json!(position.lon),
                json!(title),
                json!(icon == MarkerIcon::Current),
                self.icon_url(icon),
            ],
        );
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.call("dbwRemoveMarker", vec![json!(id.0)]);
    }

    fn set_icon(&mut self, id: MarkerId, icon: MarkerIcon) {
        self.call(
            "dbwSetIcon",
            vec![json!(id.0), json!(icon == MarkerIcon::Current), self.icon_url(icon)],
        );
    }

    fn restore_marker(&mut self, id: MarkerId) {
        self.call("dbwRestoreMarker", vec![json!(id.0)]);
    }

    fn refresh_clusters(&mut self) {
        self.call("dbwRefreshClusters", vec![]);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.call(
            "dbwFitBounds",
            vec![
                json!(bounds.south),
                json!(bounds.west),
                json!(bounds.north),
                json!(bounds.east),
            ],
        );
    }
}

/// Events raised by the maps.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    MarkerClicked { map_id: String, marker: MarkerId },
    BoundsSelected { bounds: GeoBounds, finished: bool },
}

fn set_global(name: &str, value: &JsValue) {
    if let Some(window) = web_sys::window() {
        let _ = js_sys::Reflect::set(window.as_ref(), &JsValue::from_str(name), value);
    }
}

/// Install the `window.__dbw*` callbacks the bridge script invokes.
///
/// The closures live for the rest of the page.
pub fn register_callbacks(on_event: impl Fn(MapEvent) + Clone + 'static) {
    let on_click = on_event.clone();
    let marker_click = Closure::<dyn Fn(String, f64)>::new(move |map_id: String, marker: f64| {
        on_click(MapEvent::MarkerClicked {
            map_id,
            marker: MarkerId(marker as u64),
        });
    });
    set_global("__dbwOnMarkerClick", marker_click.as_ref());
    marker_click.forget();

    let box_select = Closure::<dyn Fn(String, f64, f64, f64, f64, bool)>::new(
        move |_map_id: String, south: f64, west: f64, north: f64, east: f64, finished: bool| {
            on_event(MapEvent::BoundsSelected {
                bounds: GeoBounds::new(south, west, north, east),
                finished,
            });
        },
    );
    set_global("__dbwOnBoxSelect", box_select.as_ref());
    box_select.forget();

    let cluster_icon = Closure::<dyn Fn(bool, f64) -> js_sys::Array>::new(|any_current: bool, count: f64| {
        let icon = ClusterIcon::new(any_current, count as usize);
        let out = js_sys::Array::new();
        out.push(&JsValue::from_str(icon.class_name()));
        out.push(&JsValue::from_str(&icon.html()));
        out
    });
    set_global("__dbwClusterIcon", cluster_icon.as_ref());
    cluster_icon.forget();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_urls() {
        let layer = LeafletLayer::new("explorer-map", "/static/");
        assert_eq!(layer.icon_url(MarkerIcon::Normal), Value::Null);
        assert_eq!(
            layer.icon_url(MarkerIcon::Current),
            json!("/static/images/marker-selected-icon.png")
        );
    }

    #[test]
    fn test_reset_carries_cluster_parameters() {
        assert_eq!(LeafletLayer::cluster_args(), vec![json!(30), json!(40)]);
    }
}
