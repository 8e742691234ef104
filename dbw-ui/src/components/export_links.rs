//! Download links for the export formats.

use crate::state::AppState;
use dbw_api::server::API_PREFIX;
use dbw_api::ExportFormat;
use dioxus::prelude::*;

/// One link per export format. The server exports whatever the current
/// filter selects.
#[component]
pub fn ExportLinks() -> Element {
    let state = use_context::<AppState>();
    let base = state
        .session
        .read()
        .config()
        .base_url
        .trim_end_matches('/')
        .to_string();
    let links: Vec<(String, &'static str)> = ExportFormat::ALL
        .iter()
        .map(|f| (format!("{}/{}/export/{}", base, API_PREFIX, f.as_str()), f.as_str()))
        .collect();

    rsx! {
        div {
            style: "margin: 8px 0; display: flex; gap: 12px; align-items: center;",
            strong { "Export: " }
            for (href, name) in links {
                a { key: "{name}", href: "{href}", download: "export.{name}", "{name}" }
            }
        }
    }
}
