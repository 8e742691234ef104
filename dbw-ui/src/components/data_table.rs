//! Table of the values matching the current filter.

use crate::actions::UiAction;
use crate::components::EditableValue;
use crate::state::AppState;
use dbw_api::{ValueRow, VarData};
use dbw_sync::EditTarget;
use dioxus::prelude::*;

/// Page sizes offered by the limit selector. None is "unlimited".
const DATA_LIMITS: [Option<u32>; 5] = [Some(20), Some(50), Some(100), Some(500), None];

fn limit_label(limit: Option<u32>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}

/// Level and time range tuples, with missing members shown as `-`.
fn tuple_text(values: &[Option<i64>]) -> String {
    values
        .iter()
        .map(|v| v.map_or_else(|| "-".to_string(), |n| n.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Data table with a page size selector.
#[component]
pub fn DataTable() -> Element {
    let state = use_context::<AppState>();
    let actions = use_coroutine_handle::<UiAction>();
    let session = state.session.read();
    let rows: Vec<ValueRow> = session.rows().to_vec();
    let shown = rows.len();
    let total = session.total_count();
    let limit = session.data_limit();
    let selected_id = match session.selected() {
        Some(VarData::Value(row)) => Some(row.id),
        _ => None,
    };
    drop(session);

    let on_limit_change = move |evt: Event<FormData>| {
        let limit = evt.value().parse::<u32>().ok();
        actions.send(UiAction::SetDataLimit(limit));
    };

    rsx! {
        div {
            style: "margin: 8px 0;",
            div {
                style: "display: flex; gap: 12px; align-items: center; margin-bottom: 6px;",
                span { "Showing {shown} of {total} values" }
                label {
                    r#for: "data-limit",
                    style: "font-weight: bold;",
                    "Rows: "
                }
                select {
                    id: "data-limit",
                    onchange: on_limit_change,
                    for choice in DATA_LIMITS {
                        option {
                            value: choice.map(|n| n.to_string()).unwrap_or_default(),
                            selected: choice == limit,
                            {limit_label(choice)}
                        }
                    }
                }
            }
            table {
                style: "border-collapse: collapse; width: 100%; font-size: 0.9em;",
                thead {
                    tr {
                        style: "background: #F5F5F5; text-align: left;",
                        th { "Report" }
                        th { "Station" }
                        th { "Variable" }
                        th { "Level" }
                        th { "Time range" }
                        th { "Date" }
                        th { "Value" }
                    }
                }
                tbody {
                    for (id, row) in rows.into_iter().map(|r| (r.id, r)) {
                        DataRow {
                            key: "{id}",
                            selected: selected_id == Some(id),
                            row,
                        }
                    }
                }
            }
        }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct DataRowProps {
    pub row: ValueRow,
    pub selected: bool,
}

#[component]
fn DataRow(props: DataRowProps) -> Element {
    let actions = use_coroutine_handle::<UiAction>();
    let row = props.row;
    let background = if props.selected { "#E3F2FD" } else { "transparent" };
    let level = tuple_text(&row.level);
    let trange = tuple_text(&row.trange);
    let datetime = row.datetime.clone().unwrap_or_default();
    let clicked = row.clone();

    rsx! {
        tr {
            style: "border-bottom: 1px solid #EEE; cursor: pointer; background: {background};",
            onclick: move |_| actions.send(UiAction::SelectData(VarData::Value(clicked.clone()))),
            td { "{row.report}" }
            td { "{row.station_id}" }
            td { "{row.varcode}" }
            td { "{level}" }
            td { "{trange}" }
            td { "{datetime}" }
            td { EditableValue { target: EditTarget::Value(row.clone()) } }
        }
    }
}
