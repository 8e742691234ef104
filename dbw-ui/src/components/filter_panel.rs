//! Filter fields: one row per dimension, the station selection and the date range.

use crate::actions::UiAction;
use crate::state::AppState;
use dbw_sync::{FieldKind, FieldView, FilterField, Pending};
use dioxus::prelude::*;

/// Title shown next to a field.
fn field_title(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Choice(dimension) => dimension.title(),
        FieldKind::Station => "Station",
        FieldKind::DateRange => "Date",
    }
}

/// All filter fields, in the coordinator's order.
#[component]
pub fn FilterPanel() -> Element {
    let state = use_context::<AppState>();
    let fields: Vec<FilterField> = state.session.read().coordinator().fields().to_vec();

    rsx! {
        div {
            style: "display: grid; grid-template-columns: max-content 1fr; gap: 6px 12px; align-items: center; margin: 8px 0;",
            for (name, field) in fields.into_iter().map(|f| (f.kind().name(), f)) {
                FilterFieldRow { key: "{name}", field }
            }
        }
    }
}

#[derive(Props, Clone)]
pub struct FilterFieldRowProps {
    field: FilterField,
}

impl PartialEq for FilterFieldRowProps {
    fn eq(&self, other: &Self) -> bool {
        self.field.kind() == other.field.kind()
            && self.field.view() == other.field.view()
            && self.field.pending() == other.field.pending()
            && self.field.preview() == other.field.preview()
    }
}

#[component]
fn FilterFieldRow(props: FilterFieldRowProps) -> Element {
    let actions = use_coroutine_handle::<UiAction>();
    let field = props.field;
    let kind = field.kind();
    let title = field_title(kind);
    let name = kind.name();
    let row_style = match field.pending() {
        Pending::Local { .. } => "font-style: italic; color: #777;",
        Pending::Overridden => "color: #E65100;",
        Pending::Confirmed => "",
    };

    let input = match (field.view().clone(), kind) {
        (FieldView::Unset { .. }, FieldKind::Choice(dimension)) => {
            let menu = field.menu();
            let values: Vec<_> = menu.iter().map(|o| o.value.clone()).collect();
            let on_change = move |evt: Event<FormData>| {
                if let Some(value) = evt.value().parse::<usize>().ok().and_then(|i| values.get(i)) {
                    actions.send(UiAction::SelectChoice(dimension, value.clone()));
                }
            };
            rsx! {
                select {
                    id: "filter-{name}",
                    onchange: on_change,
                    for (i, option) in menu.iter().enumerate() {
                        option { value: "{i}", selected: i == 0, "{option.label}" }
                    }
                }
            }
        }
        (
            FieldView::Dates {
                min,
                max,
                min_placeholder,
                max_placeholder,
            },
            _,
        ) => {
            let min_text = min.unwrap_or_default();
            let max_text = max.unwrap_or_default();
            let min_hint = min_placeholder.unwrap_or_default();
            let max_hint = max_placeholder.unwrap_or_default();
            let (keep_max, keep_min) = (max_text.clone(), min_text.clone());
            rsx! {
                span {
                    style: "display: flex; gap: 8px; align-items: center;",
                    "from "
                    input {
                        r#type: "text",
                        value: "{min_text}",
                        placeholder: "{min_hint}",
                        onchange: move |evt: Event<FormData>| {
                            actions.send(UiAction::SetDates { min: evt.value(), max: keep_max.clone() });
                        },
                    }
                    " to "
                    input {
                        r#type: "text",
                        value: "{max_text}",
                        placeholder: "{max_hint}",
                        onchange: move |evt: Event<FormData>| {
                            actions.send(UiAction::SetDates { min: keep_min.clone(), max: evt.value() });
                        },
                    }
                }
            }
        }
        (view, _) => {
            let label = view.label().unwrap_or_default().to_string();
            rsx! { span { "{label}" } }
        }
    };

    rsx! {
        label {
            r#for: "filter-{name}",
            style: "font-weight: bold;",
            "{title}: "
        }
        div {
            style: "display: flex; gap: 8px; align-items: center; {row_style}",
            {input}
            if field.view().shows_remove() {
                button {
                    r#type: "button",
                    title: "Remove filter",
                    onclick: move |_| actions.send(UiAction::RemoveFilter(kind)),
                    "×"
                }
            }
            if let Some(preview) = field.preview() {
                span { style: "color: #1565C0;", "selecting {preview}" }
            }
            if field.pending() == Pending::Overridden {
                span { style: "font-size: 0.85em;", "(changed by the server)" }
            }
        }
    }
}
