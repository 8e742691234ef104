//! Explorer snapshot: the server-reported state of the current query.

use crate::StationId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One filterable choice dimension of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Report / network name
    RepMemo,
    /// Variable code (e.g. "B12101")
    Var,
    /// Vertical level
    Level,
    /// Time range
    Trange,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::RepMemo,
        Dimension::Var,
        Dimension::Level,
        Dimension::Trange,
    ];

    /// Key used for this dimension in filters and snapshots.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::RepMemo => "rep_memo",
            Dimension::Var => "var",
            Dimension::Level => "level",
            Dimension::Trange => "trange",
        }
    }

    /// Human-readable name for filter panels.
    pub fn title(self) -> &'static str {
        match self {
            Dimension::RepMemo => "Report",
            Dimension::Var => "Variable",
            Dimension::Level => "Level",
            Dimension::Trange => "Time range",
        }
    }
}

/// A filter choice: a raw value plus its display label.
///
/// On the wire an option is either a bare value (`"synop"`) or a
/// `[value, label]` pair (`["B12101", "B12101: Temperature"]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct FilterOption {
    pub value: Value,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Label used for values that come without one.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<Value> for FilterOption {
    fn from(value: Value) -> Self {
        if let Value::Array(items) = &value {
            if let [raw, Value::String(label)] = items.as_slice() {
                return FilterOption {
                    value: raw.clone(),
                    label: label.clone(),
                };
            }
        }
        FilterOption {
            label: value_label(&value),
            value,
        }
    }
}

impl From<FilterOption> for Value {
    fn from(option: FilterOption) -> Self {
        Value::Array(vec![option.value, Value::String(option.label)])
    }
}

#[derive(Deserialize, Serialize)]
struct RawStation(String, StationId, f64, f64, #[serde(default)] Option<String>);

/// A station as listed in a snapshot: `[report, id, lat, lon, ident]`, where
/// `ident` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStation", into = "RawStation")]
pub struct StationRecord {
    pub report: String,
    pub id: StationId,
    pub lat: f64,
    pub lon: f64,
    /// Mobile station identifier
    pub ident: Option<String>,
}

impl From<RawStation> for StationRecord {
    fn from(raw: RawStation) -> Self {
        let RawStation(report, id, lat, lon, ident) = raw;
        Self {
            report,
            id,
            lat,
            lon,
            ident,
        }
    }
}

impl From<StationRecord> for RawStation {
    fn from(s: StationRecord) -> Self {
        RawStation(s.report, s.id, s.lat, s.lon, s.ident)
    }
}

/// Aggregate statistics of the current selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub count: u64,
    pub datetime_min: Option<String>,
    pub datetime_max: Option<String>,
}

/// Server-reported explorer state at a point in time.
///
/// Every field has a default: a server that has not finished initializing
/// only reports empty station and option lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSnapshot {
    pub filter: BTreeMap<String, Value>,
    pub filter_cmdline: Option<String>,
    pub stations: Vec<StationRecord>,
    pub stations_disabled: Vec<StationRecord>,
    pub rep_memo: Vec<FilterOption>,
    pub var: Vec<FilterOption>,
    pub level: Vec<FilterOption>,
    pub trange: Vec<FilterOption>,
    pub stats: Stats,
    pub initialized: bool,
    pub db_url: Option<String>,
    pub data_limit: Option<u32>,
}

impl ExplorerSnapshot {
    /// Currently applied filter value for `key`; `null` counts as absent.
    pub fn filter_value(&self, key: &str) -> Option<&Value> {
        self.filter.get(key).filter(|v| !v.is_null())
    }

    /// Available options for a choice dimension.
    pub fn options(&self, dimension: Dimension) -> &[FilterOption] {
        match dimension {
            Dimension::RepMemo => &self.rep_memo,
            Dimension::Var => &self.var,
            Dimension::Level => &self.level,
            Dimension::Trange => &self.trange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_initialized_snapshot() {
        let body = json!({
            "data_limit": 20,
            "db_url": "sqlite:test.sqlite",
            "filter": {
                "ana_id": null, "datemax": null, "datemin": null, "level": null,
                "rep_memo": null, "trange": null, "var": null,
                "latmin": null, "latmax": null, "lonmin": null, "lonmax": null
            },
            "filter_cmdline": "",
            "initialized": true,
            "stations": [["synop", 1, 12.3456, 76.5432, null], ["temp", 2, 12.3456, 76.5432, null]],
            "stations_disabled": [],
            "level": [[[10, 11, 15, 22], "Layer from [10 11] to [15 22]"]],
            "trange": [[[20, 111, 222], "20 111 222"]],
            "rep_memo": ["synop", "temp"],
            "var": ["B01011", "B01012"],
            "stats": {"count": 4, "datetime_min": "1945-04-25 08:00:00", "datetime_max": "1945-04-25 08:00:00"}
        });
        let snapshot: ExplorerSnapshot = serde_json::from_value(body).unwrap();
        assert!(snapshot.initialized);
        assert_eq!(snapshot.stations.len(), 2);
        assert_eq!(snapshot.stations[1].report, "temp");
        assert_eq!(snapshot.stations[1].id, 2);
        assert_eq!(snapshot.stations[0].ident, None);
        assert_eq!(snapshot.filter_value("rep_memo"), None);
        assert_eq!(snapshot.options(Dimension::RepMemo)[1].label, "temp");
        assert_eq!(snapshot.level[0].value, json!([10, 11, 15, 22]));
        assert_eq!(snapshot.level[0].label, "Layer from [10 11] to [15 22]");
        assert_eq!(snapshot.stats.count, 4);
    }

    #[test]
    fn test_parse_uninitialized_snapshot() {
        let body = json!({"stations": [], "rep_memo": [], "level": [], "trange": [], "var": []});
        let snapshot: ExplorerSnapshot = serde_json::from_value(body).unwrap();
        assert!(!snapshot.initialized);
        assert!(snapshot.filter.is_empty());
        assert!(snapshot.stations_disabled.is_empty());
        assert_eq!(snapshot.stats, Stats::default());
    }

    #[test]
    fn test_bare_array_option_keeps_value() {
        let option = FilterOption::from(json!([1, 2, 3]));
        assert_eq!(option.value, json!([1, 2, 3]));
        assert_eq!(option.label, "[1,2,3]");
    }

    #[test]
    fn test_mobile_station_record() {
        let record: StationRecord =
            serde_json::from_value(json!(["ship", 7, 44.5, 11.25, "ABCD"])).unwrap();
        assert_eq!(record.ident.as_deref(), Some("ABCD"));
        assert_eq!(serde_json::to_value(&record).unwrap(), json!(["ship", 7, 44.5, 11.25, "ABCD"]));
    }

    #[test]
    fn test_station_record_without_ident() {
        let snapshot: ExplorerSnapshot =
            serde_json::from_str(r#"{"stations": [["synop", 1, 45.0, 9.0]]}"#).unwrap();
        assert_eq!(snapshot.stations.len(), 1);
        assert_eq!(snapshot.stations[0].id, 1);
        assert_eq!(snapshot.stations[0].ident, None);
    }
}
