//! Commands that drive an `ExplorerSession` against a running server.

use crate::print;
use anyhow::{bail, Context};
use dbw_api::http::HttpTransport;
use dbw_api::{Dimension, ExportFormat, FilterOption, Server, StationId};
use dbw_sync::{drive, Command, ExplorerConfig, ExplorerSession, FieldKind, FieldView, GeoBounds, RecordingLayer};
use log::info;
use serde_json::Value;

pub type CliSession = ExplorerSession<RecordingLayer>;
pub type CliServer = Server<HttpTransport>;

/// A parsed `key=value` argument of the `filter` command.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterItem {
    /// None removes the filter
    Choice(Dimension, Option<String>),
    Station(Option<StationId>),
    Bounds(GeoBounds),
    DateMin(String),
    DateMax(String),
}

pub fn parse_item(text: &str) -> anyhow::Result<FilterItem> {
    let (key, value) = text
        .split_once('=')
        .with_context(|| format!("'{}' is not in the form key=value", text))?;
    let value = value.trim();
    let optional = (!value.is_empty()).then(|| value.to_string());

    if let Some(dimension) = Dimension::ALL.iter().find(|d| d.key() == key) {
        return Ok(FilterItem::Choice(*dimension, optional));
    }
    match key {
        "ana_id" | "station" => {
            let id = optional
                .map(|v| v.parse::<StationId>())
                .transpose()
                .with_context(|| format!("'{}' is not a station id", value))?;
            Ok(FilterItem::Station(id))
        }
        "bounds" if value.is_empty() => Ok(FilterItem::Station(None)),
        "bounds" => {
            let coords = value
                .split(',')
                .map(|c| c.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("'{}' is not a list of coordinates", value))?;
            let [south, west, north, east] = coords[..] else {
                bail!("bounds needs south,west,north,east, got '{}'", value);
            };
            Ok(FilterItem::Bounds(GeoBounds::new(south, west, north, east)))
        }
        "datemin" => Ok(FilterItem::DateMin(value.to_string())),
        "datemax" => Ok(FilterItem::DateMax(value.to_string())),
        other => bail!("unknown filter '{}'", other),
    }
}

/// Value of the option matching `text` by value or label; anything else is
/// sent as JSON when it parses, as a string otherwise.
pub fn choice_value(options: &[FilterOption], text: &str) -> Value {
    options
        .iter()
        .find(|o| dbw_api::explorer::value_label(&o.value) == text || o.label == text)
        .map(|o| o.value.clone())
        .unwrap_or_else(|| serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// Apply the items to the session, returning the commands to run.
///
/// Every item issues its own submit; only the last one, which carries all
/// the changes, is kept.
pub fn apply_items(session: &mut CliSession, items: &[FilterItem]) -> Vec<Command> {
    let mut commands = Vec::new();
    for item in items {
        let issued = match item {
            FilterItem::Choice(dimension, None) => session.remove_filter(FieldKind::Choice(*dimension)),
            FilterItem::Choice(dimension, Some(text)) => {
                let value = {
                    let options = session.snapshot().map(|s| s.options(*dimension)).unwrap_or_default();
                    choice_value(options, text)
                };
                session.select_choice(*dimension, value)
            }
            FilterItem::Station(None) => session.remove_filter(FieldKind::Station),
            FilterItem::Station(Some(id)) => session.select_station(*id),
            FilterItem::Bounds(bounds) => session.bounds_selected(*bounds, true),
            FilterItem::DateMin(min) => {
                let (_, max) = current_dates(session);
                session.set_dates(min, &max)
            }
            FilterItem::DateMax(max) => {
                let (min, _) = current_dates(session);
                session.set_dates(&min, max)
            }
        };
        commands.extend(issued);
    }
    keep_last_submit(commands)
}

fn current_dates(session: &CliSession) -> (String, String) {
    match session.coordinator().field(FieldKind::DateRange).map(|f| f.view()) {
        Some(FieldView::Dates { min, max, .. }) => (
            min.clone().unwrap_or_default(),
            max.clone().unwrap_or_default(),
        ),
        _ => (String::new(), String::new()),
    }
}

fn keep_last_submit(commands: Vec<Command>) -> Vec<Command> {
    let last = commands
        .iter()
        .rposition(|c| matches!(c, Command::SetFilter(_)));
    commands
        .into_iter()
        .enumerate()
        .filter(|(i, c)| !matches!(c, Command::SetFilter(_)) || Some(*i) == last)
        .map(|(_, c)| c)
        .collect()
}

fn check(session: &CliSession) -> anyhow::Result<()> {
    match session.error() {
        Some(err) => bail!("{}", err),
        None => Ok(()),
    }
}

/// Client for `base_url`, once the server answers a ping.
async fn reach(base_url: &str) -> anyhow::Result<CliServer> {
    let server = Server::new(HttpTransport::new(base_url));
    server
        .ping()
        .await
        .with_context(|| format!("Server at {} is not reachable", base_url))?;
    Ok(server)
}

/// Load the explorer state from the server.
pub async fn connect(config: ExplorerConfig) -> anyhow::Result<(CliSession, CliServer)> {
    info!("Connecting to {}", config.base_url);
    let server = reach(&config.base_url).await?;
    let mut session = ExplorerSession::new(config, RecordingLayer::new(), RecordingLayer::new());
    let commands = session.start();
    drive(&mut session, &server, commands).await;
    check(&session)?;
    Ok((session, server))
}

pub async fn run_init(config: ExplorerConfig) -> anyhow::Result<()> {
    let (session, _) = connect(config).await?;
    print!("{}", print::explorer_summary(&session));
    Ok(())
}

pub async fn run_filter(config: ExplorerConfig, items: &[String]) -> anyhow::Result<()> {
    let items = items
        .iter()
        .map(|i| parse_item(i))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let (mut session, server) = connect(config).await?;
    let commands = apply_items(&mut session, &items);
    drive(&mut session, &server, commands).await;
    check(&session)?;
    print!("{}", print::explorer_summary(&session));
    if let Some(station) = session.station() {
        print!("{}", print::station_summary(station));
    }
    Ok(())
}

/// `limit` is None to keep the server's page size, Some(None) for unlimited.
pub async fn run_data(mut config: ExplorerConfig, limit: Option<Option<u32>>) -> anyhow::Result<()> {
    if let Some(limit) = limit {
        config.data_limit = limit;
    }
    let (session, _) = connect(config).await?;
    info!(
        "{} of {} values",
        session.rows().len(),
        session.total_count()
    );
    print::write_rows(session.rows(), std::io::stdout().lock())
}

pub async fn run_station(config: ExplorerConfig, id: StationId) -> anyhow::Result<()> {
    let (mut session, server) = connect(config).await?;
    drive(&mut session, &server, vec![Command::LoadStation(id)]).await;
    check(&session)?;
    match session.station() {
        Some(data) => print!("{}", print::station_summary(data)),
        None => bail!("no data for station {}", id),
    }
    Ok(())
}

pub async fn run_export(config: ExplorerConfig, format: &str, output: &str) -> anyhow::Result<()> {
    let format: ExportFormat = format.parse()?;
    let server = reach(&config.base_url).await?;
    let bytes = server.export(format).await?;
    std::fs::write(output, &bytes).with_context(|| format!("Failed to write {}", output))?;
    info!("Wrote {} bytes of {} to {}", bytes.len(), format.as_str(), output);
    Ok(())
}
