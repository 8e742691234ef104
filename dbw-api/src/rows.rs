//! Value rows, station variables, attributes, and the records used to edit them.
//!
//! Row field names follow the compact wire format (`i`, `c`, `v`, ...) and
//! are renamed here to readable Rust names.

use crate::StationId;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Integer,
    Decimal,
    String,
    #[serde(other)]
    Other,
}

impl VarType {
    /// Parse user input into a JSON value of this type.
    ///
    /// Decimals become floats, integers become integers, anything else is
    /// sent as the raw text.
    pub fn parse_input(self, text: &str) -> anyhow::Result<Value> {
        let trimmed = text.trim();
        match self {
            VarType::Decimal => {
                let v: f64 = trimmed
                    .parse()
                    .with_context(|| format!("'{}' is not a decimal number", trimmed))?;
                Ok(Value::from(v))
            }
            VarType::Integer => {
                let v: i64 = trimmed
                    .parse()
                    .with_context(|| format!("'{}' is not an integer", trimmed))?;
                Ok(Value::from(v))
            }
            VarType::String | VarType::Other => Ok(Value::String(text.to_string())),
        }
    }
}

/// Display text for a row value.
pub fn value_text(value: &Value) -> String {
    crate::explorer::value_label(value)
}

/// A measured value, as listed by `get_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    /// Context id, used to address attributes
    #[serde(rename = "i")]
    pub id: i64,
    #[serde(rename = "r")]
    pub report: String,
    #[serde(rename = "s")]
    pub station_id: StationId,
    #[serde(rename = "c")]
    pub varcode: String,
    #[serde(rename = "l")]
    pub level: Vec<Option<i64>>,
    #[serde(rename = "t")]
    pub trange: Vec<Option<i64>>,
    #[serde(rename = "d")]
    pub datetime: Option<String>,
    #[serde(rename = "v")]
    pub value: Value,
    #[serde(rename = "vt")]
    pub var_type: VarType,
    #[serde(rename = "vs", default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
}

/// A station variable, as listed by `get_station_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRow {
    #[serde(rename = "i")]
    pub id: i64,
    #[serde(rename = "c")]
    pub varcode: String,
    #[serde(rename = "v")]
    pub value: Value,
    #[serde(rename = "vt")]
    pub var_type: VarType,
    #[serde(rename = "vs", default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
}

/// An attribute of a value or station variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrRow {
    #[serde(rename = "c")]
    pub varcode: String,
    #[serde(rename = "v")]
    pub value: Value,
    #[serde(rename = "vt")]
    pub var_type: VarType,
    #[serde(rename = "vs", default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
}

/// Station details returned by `get_station_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    pub id: StationId,
    pub lat: f64,
    pub lon: f64,
    pub ident: Option<String>,
    pub rep_memo: String,
}

/// Station details and its station variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationData {
    /// None when the station does not exist (anymore)
    pub station: Option<StationInfo>,
    pub rows: Vec<VariableRow>,
}

/// The variable whose attributes are being shown or edited.
///
/// Serialized as the original row, which is what the server expects as
/// `var_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarData {
    Value(ValueRow),
    Station(VariableRow),
}

impl VarData {
    /// Context id used to address the attributes.
    pub fn id(&self) -> i64 {
        match self {
            VarData::Value(row) => row.id,
            VarData::Station(row) => row.id,
        }
    }

    pub fn varcode(&self) -> &str {
        match self {
            VarData::Value(row) => &row.varcode,
            VarData::Station(row) => &row.varcode,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            VarData::Value(row) => &row.value,
            VarData::Station(row) => &row.value,
        }
    }

    /// Measured values have a datetime; station values do not.
    pub fn is_measured(&self) -> bool {
        matches!(self, VarData::Value(row) if row.datetime.is_some())
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_measured() {
            "Measured value"
        } else {
            "Station value"
        }
    }
}

/// Record sent to `replace_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEdit {
    pub ana_id: StationId,
    pub varcode: String,
    pub level: Vec<Option<i64>>,
    pub trange: Vec<Option<i64>>,
    pub datetime: Option<String>,
    pub vt: VarType,
    pub value: Value,
}

/// Record sent to `replace_station_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDataEdit {
    pub ana_id: StationId,
    pub varcode: String,
    pub vt: VarType,
    pub value: Value,
}

/// Record sent to `replace_data_attr` / `replace_station_data_attr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrEdit {
    pub c: String,
    pub vt: VarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vs: Option<i32>,
    pub v: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_rows() {
        let rows: Vec<ValueRow> = serde_json::from_value(json!([{
            "i": 1, "r": "synop", "s": 1, "c": "B01011",
            "l": [10, 11, 15, 22], "t": [20, 111, 222],
            "d": "1945-04-25 08:00:00", "v": "Hey Hey!!", "vt": "string"
        }, {
            "i": 2, "r": "synop", "s": 1, "c": "B01012",
            "l": [10, 11, 15, 22], "t": [20, 111, 222],
            "d": "1945-04-25 08:00:00", "v": 500, "vt": "integer", "vs": 0
        }]))
        .unwrap();
        assert_eq!(rows[0].var_type, VarType::String);
        assert_eq!(rows[0].scale, None);
        assert_eq!(rows[1].value, json!(500));
        assert_eq!(rows[1].scale, Some(0));
        assert_eq!(rows[1].level, vec![Some(10), Some(11), Some(15), Some(22)]);
    }

    #[test]
    fn test_level_with_missing_components() {
        let row: ValueRow = serde_json::from_value(json!({
            "i": 5, "r": "synop", "s": 1, "c": "B12101",
            "l": [1, null, null, null], "t": [254, 0, 0],
            "d": "2020-01-01 00:00:00", "v": 273.15, "vt": "decimal", "vs": 2
        }))
        .unwrap();
        assert_eq!(row.level, vec![Some(1), None, None, None]);
    }

    #[test]
    fn test_unknown_var_type() {
        let row: AttrRow =
            serde_json::from_value(json!({"c": "B33007", "v": null, "vt": "binary"})).unwrap();
        assert_eq!(row.var_type, VarType::Other);
    }

    #[test]
    fn test_parse_input_by_type() {
        assert_eq!(VarType::Decimal.parse_input(" 12.5 ").unwrap(), json!(12.5));
        assert_eq!(VarType::Integer.parse_input("42").unwrap(), json!(42));
        assert_eq!(VarType::String.parse_input("hello").unwrap(), json!("hello"));
        assert!(VarType::Integer.parse_input("4.2").is_err());
        assert!(VarType::Decimal.parse_input("warm").is_err());
    }

    #[test]
    fn test_var_data_kind() {
        let station_row = VarData::Station(VariableRow {
            id: 9,
            varcode: "B07030".to_string(),
            value: json!(120.0),
            var_type: VarType::Decimal,
            scale: Some(1),
        });
        assert!(!station_row.is_measured());
        assert_eq!(station_row.kind_label(), "Station value");
        assert_eq!(
            serde_json::to_value(&station_row).unwrap(),
            json!({"i": 9, "c": "B07030", "v": 120.0, "vt": "decimal", "vs": 1})
        );
    }
}
