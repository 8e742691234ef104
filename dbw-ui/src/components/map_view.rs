//! Container div for a Leaflet map.

use crate::js_bridge;
use dioxus::prelude::*;

#[derive(Props, Clone, PartialEq)]
pub struct MapViewProps {
    /// DOM id, also the map id used by the marker layer
    pub id: String,
    /// Enable rectangle selection
    #[props(default = false)]
    pub box_select: bool,
    #[props(default = "height: 400px;".to_string())]
    pub style: String,
}

/// Map container. The Leaflet map is created once the div is mounted;
/// markers come from the session's map controller.
#[component]
pub fn MapView(props: MapViewProps) -> Element {
    let id = props.id.clone();
    let box_select = props.box_select;

    use_effect(move || js_bridge::create_map(&id, box_select));

    rsx! {
        div {
            id: "{props.id}",
            style: "{props.style} border: 1px solid #ccc; border-radius: 4px;",
        }
    }
}
