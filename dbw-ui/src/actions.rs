//! User actions and the coroutine that runs them against the server.
//!
//! Every action goes through the session, and the `Command`s it returns are
//! spawned as independent tasks. Each task feeds its `Completion` back and
//! spawns whatever the session asks for next. Responses may therefore come
//! back out of order; the session discards stale explorer snapshots.

use crate::fetch::FetchTransport;
use crate::js_bridge::{self, MapEvent};
use crate::state::{AppState, EXPLORER_MAP_ID, STATION_MAP_ID};
use dbw_api::{Dimension, Server, VarData};
use dbw_sync::{execute, Command, Completion, EditTarget, FieldKind};
use dioxus::prelude::*;
use futures::channel::mpsc::UnboundedReceiver;
use futures::StreamExt;
use log::debug;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Start,
    SelectChoice(Dimension, Value),
    RemoveFilter(FieldKind),
    SetDates { min: String, max: String },
    Map(MapEvent),
    SelectData(VarData),
    SetDataLimit(Option<u32>),
    BeginEdit(EditTarget),
    EditText(String),
    CommitEdit,
    CancelEdit,
    DismissError,
}

/// Install the action coroutine and the map callbacks. Call once from the root component.
pub fn use_explorer_actions(state: AppState) -> Coroutine<UiAction> {
    let actions = use_coroutine(move |rx: UnboundedReceiver<UiAction>| action_loop(state, rx));
    use_hook(move || {
        js_bridge::register_callbacks(move |event| actions.send(UiAction::Map(event)));
        js_bridge::init_maps();
    });
    actions
}

async fn action_loop(mut state: AppState, mut rx: UnboundedReceiver<UiAction>) {
    let base_url = state.session.peek().config().base_url.clone();
    let server = Server::new(FetchTransport::new(&base_url));
    while let Some(action) = rx.next().await {
        let commands = {
            let mut session = state.session.write();
            match action {
                UiAction::Start => session.start(),
                UiAction::SelectChoice(dimension, value) => session.select_choice(dimension, value),
                UiAction::RemoveFilter(kind) => session.remove_filter(kind),
                UiAction::SetDates { min, max } => session.set_dates(&min, &max),
                UiAction::Map(MapEvent::MarkerClicked { map_id, marker }) => {
                    if map_id == EXPLORER_MAP_ID {
                        session.explorer_marker_clicked(marker)
                    } else if map_id == STATION_MAP_ID {
                        session.station_marker_clicked(marker)
                    } else {
                        Vec::new()
                    }
                }
                UiAction::Map(MapEvent::BoundsSelected { bounds, finished }) => {
                    session.bounds_selected(bounds, finished)
                }
                UiAction::SelectData(var_data) => session.select_data(var_data),
                UiAction::SetDataLimit(limit) => session.set_data_limit(limit),
                UiAction::BeginEdit(target) => {
                    session.begin_edit(target);
                    Vec::new()
                }
                UiAction::EditText(text) => {
                    session.edit_text(&text);
                    Vec::new()
                }
                UiAction::CommitEdit => session.commit_edit(),
                UiAction::CancelEdit => {
                    session.cancel_edit();
                    Vec::new()
                }
                UiAction::DismissError => {
                    session.clear_error();
                    Vec::new()
                }
            }
        };
        state.sync_error();
        run_commands(state, &server, commands);
    }
}

fn run_commands(mut state: AppState, server: &Server<FetchTransport>, commands: Vec<Command>) {
    for command in commands {
        let server = server.clone();
        let is_init = command == Command::Init;
        *state.in_flight.write() += 1;
        spawn(async move {
            let completion = execute(&server, command).await;
            if let Completion::Init(Ok(snapshot)) = &completion {
                debug!(
                    "Explorer initialized from {}",
                    snapshot.db_url.as_deref().unwrap_or("unknown database")
                );
            }
            let next = state.session.write().complete(completion);
            *state.in_flight.write() -= 1;
            if is_init {
                state.loading.set(false);
            }
            state.sync_error();
            run_commands(state, &server, next);
        });
    }
}
