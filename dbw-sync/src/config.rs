//! Client configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by the browser app and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Server root; the API lives under `{base_url}/api/1.0/`
    pub base_url: String,
    /// Value rows fetched per page; None fetches everything
    pub data_limit: Option<u32>,
    /// Add `mobile` to the filter when a station is picked
    pub mobile_flag: bool,
    /// Forget stations not seen in this many snapshots
    pub station_retention: Option<u32>,
    /// Base url of marker images
    pub resource_url: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            data_limit: Some(20),
            mobile_flag: false,
            station_retention: None,
            resource_url: "/static/".to_string(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
