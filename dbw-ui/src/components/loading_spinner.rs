//! Activity indicator: the initial load, then the requests still running.

use crate::state::AppState;
use dioxus::prelude::*;

fn status_text(loading: bool, in_flight: usize) -> Option<String> {
    match (loading, in_flight) {
        (true, _) => Some("Loading explorer...".to_string()),
        (false, 0) => None,
        (false, 1) => Some("Updating...".to_string()),
        (false, n) => Some(format!("Updating ({} requests)...", n)),
    }
}

#[component]
pub fn LoadingSpinner() -> Element {
    let state = use_context::<AppState>();
    let loading = *state.loading.read();
    let Some(text) = status_text(loading, (state.in_flight)()) else {
        return rsx! {};
    };
    let style = if loading {
        "display: flex; justify-content: center; align-items: center; padding: 40px; color: #666;"
    } else {
        "color: #666; font-size: 0.85em;"
    };

    rsx! {
        div { style: "{style}", "{text}" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(true, 3).as_deref(), Some("Loading explorer..."));
        assert_eq!(status_text(false, 0), None);
        assert_eq!(status_text(false, 1).as_deref(), Some("Updating..."));
        assert_eq!(status_text(false, 4).as_deref(), Some("Updating (4 requests)..."));
    }
}
