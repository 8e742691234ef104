//! Attributes of the selected value.

use crate::components::EditableValue;
use crate::state::AppState;
use dbw_api::rows::value_text;
use dbw_api::AttrRow;
use dbw_sync::EditTarget;
use dioxus::prelude::*;

#[component]
pub fn AttrsPanel() -> Element {
    let state = use_context::<AppState>();
    let session = state.session.read();
    let Some(var_data) = session.selected().cloned() else {
        return rsx! {};
    };
    let attrs: Vec<AttrRow> = session.attrs().to_vec();
    drop(session);

    let kind = var_data.kind_label();
    let varcode = var_data.varcode().to_string();
    let value = value_text(var_data.value());

    rsx! {
        div {
            style: "margin: 8px 0; padding: 8px; border: 1px solid #DDD; border-radius: 4px;",
            h3 { style: "margin: 0 0 6px 0;", "{kind} {varcode}: {value}" }
            if attrs.is_empty() {
                p { style: "color: #666;", "No attributes" }
            } else {
                table {
                    style: "border-collapse: collapse; font-size: 0.9em;",
                    thead {
                        tr {
                            th { style: "text-align: left; padding-right: 12px;", "Attribute" }
                            th { style: "text-align: left;", "Value" }
                        }
                    }
                    tbody {
                        for attr in attrs {
                            tr {
                                key: "{attr.varcode}",
                                td { style: "padding-right: 12px;", "{attr.varcode}" }
                                td {
                                    EditableValue {
                                        target: EditTarget::Attribute { var_data: var_data.clone(), attr: attr.clone() },
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
