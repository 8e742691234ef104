//! A value cell that turns into a text input when clicked.

use crate::actions::UiAction;
use crate::state::AppState;
use dbw_api::rows::value_text;
use dbw_sync::{EditState, EditTarget};
use dioxus::prelude::*;

#[derive(Props, Clone, PartialEq)]
pub struct EditableValueProps {
    pub target: EditTarget,
}

/// Shows the target's value; while the session's editor points at this
/// target, shows the editor instead. Enter or leaving the field commits,
/// Escape rolls back.
#[component]
pub fn EditableValue(props: EditableValueProps) -> Element {
    let state = use_context::<AppState>();
    let actions = use_coroutine_handle::<UiAction>();
    let editing = state
        .session
        .read()
        .editor()
        .filter(|e| e.target() == &props.target)
        .map(|e| (e.text().to_string(), e.state().clone()));

    let Some((text, edit_state)) = editing else {
        let shown = value_text(props.target.value());
        let target = props.target.clone();
        return rsx! {
            span {
                style: "cursor: text; border-bottom: 1px dotted #999;",
                title: "Click to edit",
                onclick: move |_| actions.send(UiAction::BeginEdit(target.clone())),
                "{shown}"
            }
        };
    };

    let (border, message) = match &edit_state {
        EditState::Invalid(msg) | EditState::Failed(msg) => ("#C62828", Some(msg.clone())),
        EditState::Submitted => ("#999", None),
        EditState::Editing => ("#1565C0", None),
    };

    rsx! {
        span {
            input {
                r#type: "text",
                value: "{text}",
                autofocus: true,
                disabled: edit_state == EditState::Submitted,
                style: "border: 1px solid {border}; padding: 2px 4px;",
                oninput: move |evt: Event<FormData>| actions.send(UiAction::EditText(evt.value())),
                onkeydown: move |evt: Event<KeyboardData>| match evt.key() {
                    Key::Enter => actions.send(UiAction::CommitEdit),
                    Key::Escape => actions.send(UiAction::CancelEdit),
                    _ => {}
                },
                onblur: move |_| actions.send(UiAction::CommitEdit),
            }
            if let Some(message) = message {
                span { style: "margin-left: 6px; color: #C62828; font-size: 0.85em;", "{message}" }
            }
        }
    }
}
