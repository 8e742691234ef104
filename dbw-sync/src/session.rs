//! Routes intents between the explorer components.
//!
//! `ExplorerSession` owns the coordinator, both maps and the loaded rows.
//! User actions and server results go in, `Command`s for the server come
//! out; `execute` runs one command against a `Server`, `drive` runs a
//! command queue until the session is idle.

use crate::bus::{EventBus, Intent};
use crate::config::ExplorerConfig;
use crate::coordinator::{FilterCoordinator, SubmitTicket};
use crate::edit::{EditOutcome, EditRecord, EditState, EditTarget, InlineEdit};
use crate::field::FieldKind;
use crate::geo::GeoBounds;
use crate::layer::{MarkerId, MarkerLayer};
use crate::map_sync::MapSyncController;
use crate::station::{StationStore, StoreConfig, Tracking};
use dbw_api::{
    AttrRow, Dimension, ExplorerSnapshot, Server, StationData, StationId, Transport, ValueRow,
    VarData,
};
use log::{debug, warn};
use serde_json::Value;
use std::collections::VecDeque;

/// Server work requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init,
    SetFilter(SubmitTicket),
    LoadData,
    SetDataLimit(Option<u32>),
    LoadStation(StationId),
    LoadAttrs(VarData),
    Replace(EditRecord),
}

/// What a `replace_*` call sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum Replaced {
    Rows(Vec<ValueRow>),
    Station(StationData),
    Attrs(Vec<AttrRow>),
}

/// Result of a `Command`.
#[derive(Debug)]
pub enum Completion {
    Init(anyhow::Result<ExplorerSnapshot>),
    Filter(SubmitTicket, anyhow::Result<ExplorerSnapshot>),
    Data(anyhow::Result<Vec<ValueRow>>),
    Station(StationId, anyhow::Result<StationData>),
    Attrs(VarData, anyhow::Result<Vec<AttrRow>>),
    Replaced(EditRecord, anyhow::Result<Replaced>),
}

pub struct ExplorerSession<L> {
    config: ExplorerConfig,
    bus: EventBus,
    coordinator: FilterCoordinator,
    explorer_map: MapSyncController<L>,
    station_map: MapSyncController<L>,
    snapshot: Option<ExplorerSnapshot>,
    rows: Vec<ValueRow>,
    data_limit: Option<u32>,
    station: Option<StationData>,
    selected: Option<VarData>,
    attrs: Vec<AttrRow>,
    editor: Option<InlineEdit>,
    error: Option<String>,
}

impl<L: MarkerLayer> ExplorerSession<L> {
    pub fn new(config: ExplorerConfig, explorer_layer: L, station_layer: L) -> Self {
        let store_config = StoreConfig {
            retention: config.station_retention,
        };
        Self {
            bus: EventBus::new(),
            coordinator: FilterCoordinator::with_default_fields(config.mobile_flag),
            explorer_map: MapSyncController::new(
                explorer_layer,
                StationStore::new(Tracking::Membership, store_config),
            ),
            station_map: MapSyncController::new(
                station_layer,
                StationStore::new(Tracking::Single { current_id: None }, store_config),
            ),
            snapshot: None,
            rows: Vec::new(),
            data_limit: config.data_limit,
            station: None,
            selected: None,
            attrs: Vec::new(),
            editor: None,
            error: None,
            config,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &FilterCoordinator {
        &self.coordinator
    }

    pub fn explorer_map(&self) -> &MapSyncController<L> {
        &self.explorer_map
    }

    pub fn explorer_map_mut(&mut self) -> &mut MapSyncController<L> {
        &mut self.explorer_map
    }

    pub fn station_map(&self) -> &MapSyncController<L> {
        &self.station_map
    }

    pub fn station_map_mut(&mut self) -> &mut MapSyncController<L> {
        &mut self.station_map
    }

    pub fn snapshot(&self) -> Option<&ExplorerSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn rows(&self) -> &[ValueRow] {
        &self.rows
    }

    /// Number of values matching the filter, as counted by the server.
    pub fn total_count(&self) -> u64 {
        self.snapshot.as_ref().map_or(0, |s| s.stats.count)
    }

    pub fn data_limit(&self) -> Option<u32> {
        self.data_limit
    }

    pub fn station(&self) -> Option<&StationData> {
        self.station.as_ref()
    }

    pub fn selected(&self) -> Option<&VarData> {
        self.selected.as_ref()
    }

    pub fn attrs(&self) -> &[AttrRow] {
        &self.attrs
    }

    pub fn editor(&self) -> Option<&InlineEdit> {
        self.editor.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Commands to run when the page loads.
    pub fn start(&mut self) -> Vec<Command> {
        vec![Command::Init]
    }

    pub fn select_choice(&mut self, dimension: Dimension, value: Value) -> Vec<Command> {
        if let Some(field) = self.coordinator.field_mut(FieldKind::Choice(dimension)) {
            field.select(value, &mut self.bus);
        }
        self.process()
    }

    pub fn remove_filter(&mut self, kind: FieldKind) -> Vec<Command> {
        if let Some(field) = self.coordinator.field_mut(kind) {
            field.remove(&mut self.bus);
        }
        self.process()
    }

    pub fn set_dates(&mut self, min: &str, max: &str) -> Vec<Command> {
        if let Some(field) = self.coordinator.field_mut(FieldKind::DateRange) {
            field.set_dates(min, max, &mut self.bus);
        }
        self.process()
    }

    pub fn explorer_marker_clicked(&mut self, marker: MarkerId) -> Vec<Command> {
        self.explorer_map.marker_clicked(marker, &mut self.bus);
        self.process()
    }

    pub fn station_marker_clicked(&mut self, marker: MarkerId) -> Vec<Command> {
        self.station_map.marker_clicked(marker, &mut self.bus);
        self.process()
    }

    pub fn bounds_selected(&mut self, bounds: GeoBounds, finished: bool) -> Vec<Command> {
        self.explorer_map.bounds_selected(bounds, finished, &mut self.bus);
        self.process()
    }

    /// Select a station by id, as a click on its marker does.
    pub fn select_station(&mut self, id: StationId) -> Vec<Command> {
        match self.explorer_map.store().iter().find(|s| s.id() == id) {
            Some(station) => self.bus.emit(Intent::StationSelected(station.key().clone())),
            None => warn!("Station {} is not on the map", id),
        }
        self.process()
    }

    pub fn select_data(&mut self, var_data: VarData) -> Vec<Command> {
        self.bus.emit(Intent::DataSelected(var_data));
        self.process()
    }

    pub fn set_data_limit(&mut self, limit: Option<u32>) -> Vec<Command> {
        self.bus.emit(Intent::DataLimitChanged(limit));
        self.process()
    }

    /// Open an editor, replacing any other one.
    pub fn begin_edit(&mut self, target: EditTarget) {
        self.editor = Some(InlineEdit::begin(target));
    }

    pub fn edit_text(&mut self, text: &str) {
        if let Some(editor) = &mut self.editor {
            editor.set_text(text);
        }
    }

    /// Enter or blur on the editor.
    pub fn commit_edit(&mut self) -> Vec<Command> {
        if let Some(editor) = &mut self.editor {
            if editor.commit(&mut self.bus) == EditOutcome::RolledBack {
                self.editor = None;
            }
        }
        self.process()
    }

    /// Escape on the editor.
    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    /// Feed back the result of a command.
    pub fn complete(&mut self, completion: Completion) -> Vec<Command> {
        match completion {
            Completion::Init(Ok(snapshot)) => {
                self.error = None;
                let limit_differs = snapshot.data_limit != self.data_limit;
                if !self.coordinator.apply_initial(snapshot, &mut self.bus) {
                    debug!("Explorer state already replaced by a filter answer");
                }
                if limit_differs {
                    self.bus.emit(Intent::DataLimitChanged(self.data_limit));
                }
            }
            Completion::Init(Err(e)) => self.report("Loading the explorer", &e),
            Completion::Filter(ticket, Ok(snapshot)) => {
                if self.coordinator.apply(&ticket, snapshot, &mut self.bus) {
                    self.error = None;
                }
            }
            Completion::Filter(ticket, Err(e)) => {
                self.coordinator.fail(&ticket, &e);
                self.error = Some(format!("{:#}", e));
            }
            Completion::Data(Ok(rows)) => self.bus.emit(Intent::DataUpdated(rows)),
            Completion::Data(Err(e)) => self.report("Loading values", &e),
            Completion::Station(_, Ok(data)) => self.bus.emit(Intent::StationDataUpdated(data)),
            Completion::Station(id, Err(e)) => self.report(&format!("Loading station {}", id), &e),
            Completion::Attrs(var_data, Ok(attrs)) => {
                self.bus.emit(Intent::ValueUpdated { var_data, attrs })
            }
            Completion::Attrs(var_data, Err(e)) => {
                self.report(&format!("Loading attributes of {}", var_data.varcode()), &e)
            }
            Completion::Replaced(record, Ok(result)) => {
                if self
                    .editor
                    .as_ref()
                    .is_some_and(|e| e.state() == &EditState::Submitted)
                {
                    self.editor = None;
                }
                match (result, record) {
                    (Replaced::Rows(rows), _) => self.bus.emit(Intent::DataUpdated(rows)),
                    (Replaced::Station(data), _) => self.bus.emit(Intent::StationDataUpdated(data)),
                    (Replaced::Attrs(attrs), EditRecord::Attr { var_data, .. }) => {
                        self.bus.emit(Intent::ValueUpdated { var_data, attrs })
                    }
                    (Replaced::Attrs(attrs), _) => self.attrs = attrs,
                }
            }
            Completion::Replaced(_, Err(e)) => {
                if let Some(editor) = &mut self.editor {
                    editor.fail(&e);
                }
                self.report("Saving the value", &e);
            }
        }
        self.process()
    }

    fn report(&mut self, what: &str, err: &anyhow::Error) {
        warn!("{} failed: {:#}", what, err);
        self.error = Some(format!("{} failed: {:#}", what, err));
    }

    /// Route every pending intent, collecting the resulting commands.
    pub fn process(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Some(intent) = self.bus.pop() {
            self.route(intent, &mut commands);
        }
        commands
    }

    fn route(&mut self, intent: Intent, commands: &mut Vec<Command>) {
        match intent {
            Intent::StationSelected(key) => {
                if let Some(field) = self.coordinator.field_mut(FieldKind::Station) {
                    field.select_station(&key, &mut self.bus);
                }
                commands.push(Command::LoadStation(key.id));
            }
            Intent::BoundsSelected { bounds, finished } => {
                if let Some(field) = self.coordinator.field_mut(FieldKind::Station) {
                    field.select_bounds(bounds, finished, &mut self.bus);
                }
            }
            Intent::FilterChanged => {
                // One submit carries every change made before it
                if !commands.iter().any(|c| matches!(c, Command::SetFilter(_))) {
                    commands.push(Command::SetFilter(self.coordinator.begin_submit()));
                }
            }
            Intent::ExplorerUpdated(snapshot) => {
                self.explorer_map
                    .update_stations(&snapshot.stations, &snapshot.stations_disabled);
                self.station_map
                    .update_stations(&snapshot.stations, &snapshot.stations_disabled);
                debug!(
                    "Explorer updated: {} stations, {} values",
                    snapshot.stations.len(),
                    snapshot.stats.count
                );
                self.snapshot = Some(snapshot);
                if !commands
                    .iter()
                    .any(|c| matches!(c, Command::LoadData | Command::SetDataLimit(_)))
                {
                    commands.push(Command::LoadData);
                }
            }
            Intent::DataUpdated(rows) => self.rows = rows,
            Intent::DataSelected(var_data) => {
                self.selected = Some(var_data.clone());
                commands.push(Command::LoadAttrs(var_data));
            }
            Intent::DataLimitChanged(limit) => {
                self.data_limit = limit;
                commands.retain(|c| !matches!(c, Command::LoadData | Command::SetDataLimit(_)));
                commands.push(Command::SetDataLimit(limit));
            }
            Intent::ValueEditCommitted(record) => commands.push(Command::Replace(record)),
            Intent::StationDataUpdated(data) => {
                self.station_map
                    .focus_station(data.station.as_ref().map(|s| s.id));
                self.station = Some(data);
            }
            Intent::ValueUpdated { var_data, attrs } => {
                self.selected = Some(var_data);
                self.attrs = attrs;
            }
        }
    }
}

/// Run one command against the server.
pub async fn execute<T: Transport>(server: &Server<T>, command: Command) -> Completion {
    match command {
        Command::Init => Completion::Init(server.init().await),
        Command::SetFilter(ticket) => {
            let result = server.set_filter(&ticket.filter).await;
            Completion::Filter(ticket, result)
        }
        Command::LoadData => Completion::Data(server.get_data().await),
        Command::SetDataLimit(limit) => Completion::Data(server.set_data_limit(limit).await),
        Command::LoadStation(id) => Completion::Station(id, server.get_station_data(id).await),
        Command::LoadAttrs(var_data) => {
            let result = server.get_attrs(&var_data).await;
            Completion::Attrs(var_data, result)
        }
        Command::Replace(record) => {
            let result = match &record {
                EditRecord::Data(rec) => server.replace_data(rec).await.map(Replaced::Rows),
                EditRecord::StationData(rec) => server
                    .replace_station_data(rec)
                    .await
                    .map(Replaced::Station),
                EditRecord::Attr { var_data, rec } => server
                    .replace_attr(var_data, rec)
                    .await
                    .map(Replaced::Attrs),
            };
            Completion::Replaced(record, result)
        }
    }
}

/// Execute commands one at a time, feeding results back, until none are left.
pub async fn drive<T: Transport, L: MarkerLayer>(
    session: &mut ExplorerSession<L>,
    server: &Server<T>,
    commands: Vec<Command>,
) {
    let mut queue: VecDeque<Command> = commands.into();
    while let Some(command) = queue.pop_front() {
        let completion = execute(server, command).await;
        queue.extend(session.complete(completion));
    }
}
