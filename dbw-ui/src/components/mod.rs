//! Dioxus RSX components for the explorer app.

mod attrs_panel;
mod data_table;
mod editable_value;
mod error_display;
mod export_links;
mod filter_panel;
mod loading_spinner;
mod map_view;
mod station_panel;

pub use attrs_panel::AttrsPanel;
pub use data_table::DataTable;
pub use editable_value::EditableValue;
pub use error_display::ErrorDisplay;
pub use export_links::ExportLinks;
pub use filter_panel::FilterPanel;
pub use loading_spinner::LoadingSpinner;
pub use map_view::MapView;
pub use station_panel::StationPanel;
