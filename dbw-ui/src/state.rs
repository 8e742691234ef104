//! Application state managed via Dioxus context.
//!
//! `AppState` bundles the reactive signals into a single struct provided via
//! `use_context_provider`. Child components retrieve it with
//! `use_context::<AppState>()` and send `UiAction`s to the coroutine
//! installed by `actions::use_explorer_actions`.

use crate::js_bridge::LeafletLayer;
use dbw_sync::{ExplorerConfig, ExplorerSession};
use dioxus::prelude::*;

/// DOM id of the map in the explorer page.
pub const EXPLORER_MAP_ID: &str = "explorer-map";
/// DOM id of the map in the station panel.
pub const STATION_MAP_ID: &str = "station-map";

pub type Session = ExplorerSession<LeafletLayer>;

/// Shared application state for the explorer app.
#[derive(Clone, Copy)]
pub struct AppState {
    /// Engine state: filter fields, maps, rows, station and editor
    pub session: Signal<Session>,
    /// True until the first explorer snapshot arrives
    pub loading: Signal<bool>,
    /// Requests currently in flight
    pub in_flight: Signal<usize>,
    /// Error message if something went wrong
    pub error_msg: Signal<Option<String>>,
}

impl AppState {
    pub fn new(config: ExplorerConfig) -> Self {
        let explorer_layer = LeafletLayer::new(EXPLORER_MAP_ID, &config.resource_url);
        let station_layer = LeafletLayer::new(STATION_MAP_ID, &config.resource_url);
        let session = ExplorerSession::new(config, explorer_layer, station_layer);
        Self {
            session: Signal::new(session),
            loading: Signal::new(true),
            in_flight: Signal::new(0),
            error_msg: Signal::new(None),
        }
    }

    /// Copy the session error into `error_msg`.
    pub fn sync_error(mut self) {
        let error = self.session.peek().error().map(str::to_string);
        if *self.error_msg.peek() != error {
            self.error_msg.set(error);
        }
    }
}
