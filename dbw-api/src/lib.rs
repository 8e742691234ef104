//! Wire types and typed client for the observation explorer web API.
//!
//! - `explorer`: the explorer snapshot returned by `init` and `set_filter`
//! - `rows`: value rows, station variables, attributes and edit records
//! - `filter`: the aggregate filter object posted to `set_filter`
//! - `server`: the `Transport` seam and the typed `Server` client
//! - `http`: reqwest-backed transport (feature `api`, native only)

pub mod explorer;
pub mod filter;
pub mod rows;
pub mod server;

#[cfg(feature = "api")]
pub mod http;

pub use explorer::{Dimension, ExplorerSnapshot, FilterOption, Stats, StationRecord};
pub use filter::Filter;
pub use rows::{AttrRow, StationData, StationInfo, ValueRow, VarData, VarType, VariableRow};
pub use server::{ApiError, ExportFormat, Server, Transport};

/// Backend station identifier (`ana_id`).
pub type StationId = i64;
