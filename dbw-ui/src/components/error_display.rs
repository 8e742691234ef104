//! Error display component.

use crate::actions::UiAction;
use dioxus::prelude::*;

#[derive(Props, Clone, PartialEq)]
pub struct ErrorDisplayProps {
    pub message: String,
}

/// Displays an error message in a styled box with a dismiss button.
#[component]
pub fn ErrorDisplay(props: ErrorDisplayProps) -> Element {
    let actions = use_coroutine_handle::<UiAction>();
    rsx! {
        div {
            style: "padding: 12px 16px; margin: 8px 0; background: #FFEBEE; color: #C62828; border-radius: 4px; border: 1px solid #EF9A9A; display: flex; justify-content: space-between;",
            span {
                strong { "Error: " }
                "{props.message}"
            }
            button {
                r#type: "button",
                style: "border: none; background: none; color: #C62828; cursor: pointer;",
                onclick: move |_| actions.send(UiAction::DismissError),
                "×"
            }
        }
    }
}
