//! Details of the station picked on the map.

use crate::actions::UiAction;
use crate::components::{EditableValue, MapView};
use crate::state::{AppState, STATION_MAP_ID};
use dbw_api::{StationData, VarData};
use dbw_sync::EditTarget;
use dioxus::prelude::*;

/// Station info, station variables and a map centered on the station.
#[component]
pub fn StationPanel() -> Element {
    let state = use_context::<AppState>();
    let actions = use_coroutine_handle::<UiAction>();
    let Some(data) = state.session.read().station().cloned() else {
        return rsx! {};
    };
    let StationData { station, rows } = data;

    let Some(info) = station else {
        return rsx! {
            div { style: "margin: 8px 0; color: #666;", "The station no longer exists." }
        };
    };
    let ident = info.ident.clone().unwrap_or_else(|| "fixed station".to_string());
    let station_id = info.id;
    let position = format!("{:.5}, {:.5}", info.lat, info.lon);

    rsx! {
        div {
            style: "margin: 8px 0; padding: 8px; border: 1px solid #DDD; border-radius: 4px;",
            h3 { style: "margin: 0 0 6px 0;", "Station {info.id} ({info.rep_memo})" }
            p { "{position}, {ident}" }
            div {
                style: "display: flex; gap: 16px;",
                table {
                    style: "border-collapse: collapse; font-size: 0.9em;",
                    tbody {
                        for row in rows {
                            tr {
                                key: "{row.id}",
                                style: "cursor: pointer;",
                                onclick: {
                                    let clicked = row.clone();
                                    move |_| actions.send(UiAction::SelectData(VarData::Station(clicked.clone())))
                                },
                                td { style: "padding-right: 12px;", "{row.varcode}" }
                                td {
                                    EditableValue {
                                        target: EditTarget::StationVariable { station_id, row: row.clone() },
                                    }
                                }
                            }
                        }
                    }
                }
                MapView { id: STATION_MAP_ID.to_string(), style: "height: 250px; flex: 1;".to_string() }
            }
        }
    }
}
