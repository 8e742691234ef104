//! Typed client for the explorer web API.
//!
//! `Server` knows the endpoint names, argument shapes and response shapes.
//! Moving bytes is delegated to a `Transport`, so the same client runs on
//! reqwest natively and on `fetch` in the browser.

use crate::explorer::ExplorerSnapshot;
use crate::filter::Filter;
use crate::rows::{AttrEdit, AttrRow, DataEdit, StationData, StationDataEdit, ValueRow, VarData};
use crate::StationId;
use anyhow::Context;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Base path of every API endpoint, relative to the server root.
pub const API_PREFIX: &str = "api/1.0";

/// Moves JSON requests to the server and back.
///
/// Implementations return the decoded JSON body for both successful and
/// error responses whenever the body is JSON; `Server` turns error payloads
/// into `ApiError`s.
pub trait Transport {
    fn get(
        &self,
        name: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = anyhow::Result<Value>>;

    fn post(&self, name: &str, body: Value) -> impl Future<Output = anyhow::Result<Value>>;

    /// Fetch a raw, non-JSON body (exports).
    fn download(&self, name: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>>;
}

/// Error payload returned by the server on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Export file formats offered by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Bufr,
    Crex,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Bufr, ExportFormat::Crex];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Bufr => "bufr",
            ExportFormat::Crex => "crex",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "bufr" => Ok(ExportFormat::Bufr),
            "crex" => Ok(ExportFormat::Crex),
            other => anyhow::bail!("unsupported export format '{}'", other),
        }
    }
}

#[derive(Deserialize)]
struct ExplorerResponse {
    explorer: ExplorerSnapshot,
}

#[derive(Deserialize)]
struct RowsResponse<T> {
    rows: Vec<T>,
}

/// Typed client for the explorer API.
#[derive(Debug, Clone)]
pub struct Server<T> {
    transport: T,
}

impl<T: Transport> Server<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn decode<R: DeserializeOwned>(name: &str, body: Value) -> anyhow::Result<R> {
        if body.get("error").and_then(Value::as_bool) == Some(true) {
            let err: ApiError = serde_json::from_value(body).unwrap_or(ApiError {
                code: 0,
                message: "malformed error response".to_string(),
            });
            return Err(anyhow::Error::new(err).context(format!("API call {} failed", name)));
        }
        if body.get("initializing").and_then(Value::as_bool) == Some(true) {
            debug!("API {}: server is still initializing", name);
        }
        serde_json::from_value(body).with_context(|| format!("Failed to decode {} response", name))
    }

    async fn get<R: DeserializeOwned>(&self, name: &str, query: &[(&str, String)]) -> anyhow::Result<R> {
        let body = self.transport.get(name, query).await?;
        Self::decode(name, body)
    }

    async fn post<R: DeserializeOwned>(&self, name: &str, args: Value) -> anyhow::Result<R> {
        let body = self.transport.post(name, args).await?;
        Self::decode(name, body)
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let _: Value = self.get("ping", &[]).await?;
        Ok(())
    }

    /// Initial explorer state.
    pub async fn init(&self) -> anyhow::Result<ExplorerSnapshot> {
        let res: ExplorerResponse = self.get("init", &[]).await?;
        Ok(res.explorer)
    }

    /// Replace the server-side filter and return the new explorer state.
    pub async fn set_filter(&self, filter: &Filter) -> anyhow::Result<ExplorerSnapshot> {
        let res: ExplorerResponse = self.post("set_filter", json!({ "filter": filter })).await?;
        Ok(res.explorer)
    }

    /// Value rows for the current filter, up to the server-held limit.
    pub async fn get_data(&self) -> anyhow::Result<Vec<ValueRow>> {
        let res: RowsResponse<ValueRow> = self.get("get_data", &[]).await?;
        Ok(res.rows)
    }

    /// Change the row limit (`None` = unlimited) and return the new rows.
    pub async fn set_data_limit(&self, limit: Option<u32>) -> anyhow::Result<Vec<ValueRow>> {
        let res: RowsResponse<ValueRow> =
            self.post("set_data_limit", json!({ "limit": limit })).await?;
        Ok(res.rows)
    }

    pub async fn get_station_data(&self, id: StationId) -> anyhow::Result<StationData> {
        self.get("get_station_data", &[("id_station", id.to_string())])
            .await
    }

    pub async fn get_data_attrs(&self, id: i64) -> anyhow::Result<Vec<AttrRow>> {
        let res: RowsResponse<AttrRow> = self.get("get_data_attrs", &[("id", id.to_string())]).await?;
        Ok(res.rows)
    }

    pub async fn get_station_data_attrs(&self, id: i64) -> anyhow::Result<Vec<AttrRow>> {
        let res: RowsResponse<AttrRow> = self
            .get("get_station_data_attrs", &[("id", id.to_string())])
            .await?;
        Ok(res.rows)
    }

    /// Attributes of a value or station variable, using the matching endpoint.
    pub async fn get_attrs(&self, var_data: &VarData) -> anyhow::Result<Vec<AttrRow>> {
        match var_data {
            VarData::Value(row) => self.get_data_attrs(row.id).await,
            VarData::Station(row) => self.get_station_data_attrs(row.id).await,
        }
    }

    pub async fn replace_data(&self, rec: &DataEdit) -> anyhow::Result<Vec<ValueRow>> {
        let res: RowsResponse<ValueRow> = self.post("replace_data", json!({ "rec": rec })).await?;
        Ok(res.rows)
    }

    pub async fn replace_station_data(&self, rec: &StationDataEdit) -> anyhow::Result<StationData> {
        self.post("replace_station_data", json!({ "rec": rec })).await
    }

    /// Replace one attribute and return the updated attribute list.
    pub async fn replace_attr(&self, var_data: &VarData, rec: &AttrEdit) -> anyhow::Result<Vec<AttrRow>> {
        let name = match var_data {
            VarData::Value(_) => "replace_data_attr",
            VarData::Station(_) => "replace_station_data_attr",
        };
        let res: RowsResponse<AttrRow> = self
            .post(name, json!({ "var_data": var_data, "rec": rec }))
            .await?;
        Ok(res.rows)
    }

    /// Download the currently selected data in the given format.
    pub async fn export(&self, format: ExportFormat) -> anyhow::Result<Vec<u8>> {
        self.transport
            .download(&format!("export/{}", format.as_str()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::VarType;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Transport answering from canned responses and recording requests.
    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<String, Value>,
        requests: RefCell<Vec<(String, Value)>>,
    }

    impl FakeTransport {
        fn with(mut self, name: &str, body: Value) -> Self {
            self.responses.insert(name.to_string(), body);
            self
        }

        fn answer(&self, name: &str, args: Value) -> anyhow::Result<Value> {
            self.requests.borrow_mut().push((name.to_string(), args));
            self.responses
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no route {}", name))
        }
    }

    impl Transport for FakeTransport {
        async fn get(&self, name: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
            let args: serde_json::Map<String, Value> = query
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect();
            self.answer(name, Value::Object(args))
        }

        async fn post(&self, name: &str, body: Value) -> anyhow::Result<Value> {
            self.answer(name, body)
        }

        async fn download(&self, name: &str) -> anyhow::Result<Vec<u8>> {
            self.answer(name, Value::Null)
                .map(|v| v.as_str().unwrap_or_default().as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_set_filter_posts_filter_object() {
        let transport = FakeTransport::default().with(
            "set_filter",
            json!({"explorer": {"initialized": true, "stations": [["synop", 1, 45.0, 9.0, null]]}, "time": 100}),
        );
        let server = Server::new(transport);
        let snapshot = server
            .set_filter(&Filter::single("rep_memo", "synop"))
            .await
            .unwrap();
        assert_eq!(snapshot.stations.len(), 1);
        let requests = server.transport().requests.borrow();
        assert_eq!(requests[0].0, "set_filter");
        assert_eq!(requests[0].1, json!({"filter": {"rep_memo": "synop"}}));
    }

    #[tokio::test]
    async fn test_ping() {
        let server = Server::new(FakeTransport::default().with("ping", json!({"time": 3})));
        server.ping().await.unwrap();
        assert_eq!(server.transport().requests.borrow()[0].0, "ping");

        let down = Server::new(FakeTransport::default());
        assert!(down.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_error_payload_becomes_api_error() {
        let transport = FakeTransport::default().with(
            "get_data",
            json!({"error": true, "code": 500, "message": "database is locked"}),
        );
        let server = Server::new(transport);
        let err = server.get_data().await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.code, 500);
        assert_eq!(api_err.message, "database is locked");
    }

    #[tokio::test]
    async fn test_station_data_query_argument() {
        let transport = FakeTransport::default().with(
            "get_station_data",
            json!({
                "station": {"id": 3, "lat": 44.5, "lon": 11.3, "ident": null, "rep_memo": "synop"},
                "rows": [{"i": 12, "c": "B07030", "v": 45.0, "vt": "decimal", "vs": 1}]
            }),
        );
        let server = Server::new(transport);
        let data = server.get_station_data(3).await.unwrap();
        assert_eq!(data.station.unwrap().rep_memo, "synop");
        assert_eq!(data.rows[0].var_type, VarType::Decimal);
        let requests = server.transport().requests.borrow();
        assert_eq!(requests[0].1, json!({"id_station": "3"}));
    }

    #[tokio::test]
    async fn test_replace_attr_picks_endpoint() {
        let transport = FakeTransport::default()
            .with("replace_station_data_attr", json!({"rows": []}));
        let server = Server::new(transport);
        let var_data = VarData::Station(crate::rows::VariableRow {
            id: 4,
            varcode: "B07030".to_string(),
            value: json!(10.0),
            var_type: VarType::Decimal,
            scale: Some(1),
        });
        let rec = AttrEdit {
            c: "B33007".to_string(),
            vt: VarType::Integer,
            vs: Some(0),
            v: json!(70),
        };
        let rows = server.replace_attr(&var_data, &rec).await.unwrap();
        assert!(rows.is_empty());
        let requests = server.transport().requests.borrow();
        assert_eq!(requests[0].0, "replace_station_data_attr");
        assert_eq!(requests[0].1["rec"]["v"], json!(70));
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
