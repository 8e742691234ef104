//! Observation explorer web app.
//!
//! The host page loads Leaflet, Leaflet.markercluster and the box-select
//! plugin, provides a `#dbw-explorer-root` element and may set
//! `window.__dbwConfig` to override the defaults of `ExplorerConfig`.
//!
//! Data flow:
//! 1. On mount: the action coroutine sends `init` and fills the filter
//!    fields, both maps and the data table from the explorer snapshot.
//! 2. Filter changes, map clicks and rectangle selections go through the
//!    session, which posts the aggregate filter and reloads the values.
//! 3. Clicking a value shows its attributes; clicking its cell edits it.

use dbw_sync::ExplorerConfig;
use dbw_ui::actions::{use_explorer_actions, UiAction};
use dbw_ui::components::{
    AttrsPanel, DataTable, ErrorDisplay, ExportLinks, FilterPanel, LoadingSpinner, MapView,
    StationPanel,
};
use dbw_ui::state::{AppState, EXPLORER_MAP_ID};
use dioxus::prelude::*;
use log::warn;
use wasm_bindgen::JsValue;

fn main() {
    dioxus_logger::init(dioxus_logger::tracing::Level::INFO).expect("failed to init logger");
    dioxus::LaunchBuilder::new()
        .with_cfg(dioxus::web::Config::new().rootname("dbw-explorer-root"))
        .launch(App);
}

/// Config from `window.__dbwConfig`. Without one, the API is served by the
/// page's own origin.
fn page_config() -> ExplorerConfig {
    let same_origin = ExplorerConfig {
        base_url: String::new(),
        ..ExplorerConfig::default()
    };
    let Some(window) = web_sys::window() else {
        return same_origin;
    };
    let value = js_sys::Reflect::get(window.as_ref(), &JsValue::from_str("__dbwConfig"))
        .unwrap_or(JsValue::UNDEFINED);
    if value.is_undefined() || value.is_null() {
        return same_origin;
    }
    let text = js_sys::JSON::stringify(&value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_default();
    match ExplorerConfig::from_json(&text) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring invalid window.__dbwConfig: {:#}", e);
            same_origin
        }
    }
}

#[component]
fn App() -> Element {
    let state = use_context_provider(|| AppState::new(page_config()));
    let actions = use_explorer_actions(state);

    // ─── Load the explorer once on mount ───
    use_effect(move || actions.send(UiAction::Start));

    rsx! {
        div {
            style: "font-family: sans-serif; max-width: 1200px; margin: 0 auto; padding: 16px;",
            h1 { style: "margin: 0 0 8px 0;", "Observation explorer" }
            if let Some(err) = state.error_msg.read().as_ref() {
                ErrorDisplay { message: err.clone() }
            }
            if *state.loading.read() {
                LoadingSpinner {}
            }
            div {
                style: "display: flex; gap: 16px; align-items: flex-start;",
                div {
                    style: "flex: 0 0 380px;",
                    FilterPanel {}
                    ExportLinks {}
                    if !*state.loading.read() {
                        LoadingSpinner {}
                    }
                }
                div {
                    style: "flex: 1;",
                    MapView { id: EXPLORER_MAP_ID.to_string(), box_select: true }
                }
            }
            StationPanel {}
            AttrsPanel {}
            DataTable {}
        }
    }
}
