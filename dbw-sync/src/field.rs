//! Filter fields.
//!
//! Every filterable dimension is a `FilterField`; what differs between a
//! dropdown, the map selection and the date range is the `FieldKind` tag.
//! A field owns its contribution to the aggregate filter and the state shown
//! by its widget, and recomputes both from each applied snapshot.

use crate::bus::{EventBus, Intent};
use crate::geo::GeoBounds;
use crate::station::StationKey;
use dbw_api::explorer::value_label;
use dbw_api::{Dimension, ExplorerSnapshot, Filter, FilterOption};
use dbw_utils::coords::round_coord;
use dbw_utils::dates::{complete_max, complete_min};
use log::{info, warn};
use serde_json::Value;

/// Label of the "no choice" entry at the top of a choice menu.
pub const UNSPECIFIED: &str = "-------";

const STATION_KEYS: [&str; 6] = ["ana_id", "mobile", "latmin", "latmax", "lonmin", "lonmax"];
const BOUNDS_KEYS: [&str; 4] = ["latmin", "latmax", "lonmin", "lonmax"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Dropdown over the options the server offers for a dimension.
    Choice(Dimension),
    /// Station or rectangle picked on the map.
    Station,
    /// Free-text datetime bounds.
    DateRange,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Choice(dimension) => dimension.key(),
            FieldKind::Station => "station",
            FieldKind::DateRange => "datetime",
        }
    }
}

/// Where the field's contribution comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// Mirrors the last applied snapshot.
    Confirmed,
    /// Changed by the user. `seq` is the submit carrying the change, once
    /// one has been issued.
    Local { seq: Option<u64> },
    /// The server answered the change with a different value, which is now
    /// shown instead.
    Overridden,
}

/// What the field's widget shows.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldView {
    /// Only one option exists: shown as text, nothing to choose.
    Forced { label: String },
    /// Menu with the unspecified entry followed by these options.
    Unset { options: Vec<FilterOption> },
    /// A value is chosen: shown as text with a remove button.
    Chosen { label: String },
    /// Station field without a selection.
    AllStations,
    Dates {
        min: Option<String>,
        max: Option<String>,
        min_placeholder: Option<String>,
        max_placeholder: Option<String>,
    },
}

impl FieldView {
    pub fn shows_input(&self) -> bool {
        matches!(self, FieldView::Unset { .. } | FieldView::Dates { .. })
    }

    pub fn shows_remove(&self) -> bool {
        match self {
            FieldView::Chosen { .. } => true,
            FieldView::Dates { min, max, .. } => min.is_some() || max.is_some(),
            _ => false,
        }
    }

    /// Read-only text of the field, if it shows one.
    pub fn label(&self) -> Option<&str> {
        match self {
            FieldView::Forced { label } | FieldView::Chosen { label } => Some(label),
            FieldView::AllStations => Some("all"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterField {
    kind: FieldKind,
    contribution: Filter,
    pending: Pending,
    view: FieldView,
    preview: Option<String>,
    options: Vec<FilterOption>,
    mobile_flag: bool,
}

impl FilterField {
    fn new(kind: FieldKind, view: FieldView) -> Self {
        Self {
            kind,
            contribution: Filter::new(),
            pending: Pending::Confirmed,
            view,
            preview: None,
            options: Vec::new(),
            mobile_flag: false,
        }
    }

    pub fn choice(dimension: Dimension) -> Self {
        Self::new(FieldKind::Choice(dimension), FieldView::Unset { options: Vec::new() })
    }

    /// Station field; with `mobile_flag` a selected station also filters on
    /// whether it is mobile.
    pub fn station(mobile_flag: bool) -> Self {
        let mut field = Self::new(FieldKind::Station, FieldView::AllStations);
        field.mobile_flag = mobile_flag;
        field
    }

    pub fn date_range() -> Self {
        Self::new(
            FieldKind::DateRange,
            FieldView::Dates {
                min: None,
                max: None,
                min_placeholder: None,
                max_placeholder: None,
            },
        )
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// This field's part of the aggregate filter.
    pub fn contribution(&self) -> &Filter {
        &self.contribution
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn view(&self) -> &FieldView {
        &self.view
    }

    /// Bounds being dragged on the map, not yet part of the filter.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// Menu entries of an unset choice field, the unspecified entry first.
    pub fn menu(&self) -> Vec<FilterOption> {
        match &self.view {
            FieldView::Unset { options } => std::iter::once(FilterOption::new(Value::Null, UNSPECIFIED))
                .chain(options.iter().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn stamp(&mut self, seq: u64) {
        if let Pending::Local { seq: stamp @ None } = &mut self.pending {
            *stamp = Some(seq);
        }
    }

    fn set_local(&mut self, contribution: Filter, bus: &mut EventBus) {
        self.contribution = contribution;
        self.pending = Pending::Local { seq: None };
        self.preview = None;
        self.view = self.render(None);
        bus.emit(Intent::FilterChanged);
    }

    fn wrong_kind(&self, action: &str) {
        warn!("{} is not supported by the {} field", action, self.kind.name());
    }

    /// Pick an option of a choice field. Picking the unspecified entry
    /// clears the field.
    pub fn select(&mut self, value: Value, bus: &mut EventBus) {
        let FieldKind::Choice(dimension) = self.kind else {
            return self.wrong_kind("select");
        };
        if value.is_null() {
            return self.remove(bus);
        }
        self.set_local(Filter::single(dimension.key(), value), bus);
    }

    /// Drop this field's contribution.
    pub fn remove(&mut self, bus: &mut EventBus) {
        self.set_local(Filter::new(), bus);
    }

    pub fn select_station(&mut self, station: &StationKey, bus: &mut EventBus) {
        if self.kind != FieldKind::Station {
            return self.wrong_kind("select_station");
        }
        let mut filter = Filter::single("ana_id", station.id);
        if self.mobile_flag {
            filter.insert("mobile", i64::from(station.is_mobile()));
        }
        self.set_local(filter, bus);
    }

    /// Rectangle selection. Until `finished`, only the preview changes.
    pub fn select_bounds(&mut self, bounds: GeoBounds, finished: bool, bus: &mut EventBus) {
        if self.kind != FieldKind::Station {
            return self.wrong_kind("select_bounds");
        }
        let filter: Filter = bounds
            .rounded()
            .filter_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if finished {
            self.set_local(filter, bus);
        } else {
            self.preview = Some(station_text(&filter));
        }
    }

    /// Set the date bounds from free text. Text that is not a datetime
    /// leaves that bound open.
    pub fn set_dates(&mut self, min: &str, max: &str, bus: &mut EventBus) {
        if self.kind != FieldKind::DateRange {
            return self.wrong_kind("set_dates");
        }
        let mut filter = Filter::new();
        if let Some(datemin) = complete_min(min) {
            filter.insert("datemin", datemin);
        }
        if let Some(datemax) = complete_max(max) {
            filter.insert("datemax", datemax);
        }
        self.set_local(filter, bus);
    }

    /// The contribution the server considers applied in `snapshot`.
    fn server_contribution(&self, snapshot: &ExplorerSnapshot) -> Filter {
        let mut filter = Filter::new();
        match self.kind {
            FieldKind::Choice(dimension) => {
                if let Some(value) = snapshot.filter_value(dimension.key()) {
                    filter.insert(dimension.key(), value.clone());
                }
            }
            FieldKind::Station => {
                if let Some(id) = snapshot.filter_value("ana_id") {
                    filter.insert("ana_id", id.clone());
                    if let Some(mobile) = snapshot.filter_value("mobile") {
                        filter.insert("mobile", mobile.clone());
                    }
                } else if snapshot.filter_value("latmin").is_some() {
                    let bounds: Option<Vec<f64>> = BOUNDS_KEYS
                        .iter()
                        .map(|key| snapshot.filter_value(key).and_then(coordinate))
                        .collect();
                    match bounds {
                        Some(values) => {
                            for (key, value) in BOUNDS_KEYS.iter().zip(values) {
                                filter.insert(*key, round_coord(value));
                            }
                        }
                        None => warn!("Ignoring malformed bounds in filter {:?}", snapshot.filter),
                    }
                }
            }
            FieldKind::DateRange => {
                for key in ["datemin", "datemax"] {
                    if let Some(value) = snapshot.filter_value(key) {
                        filter.insert(key, value.clone());
                    }
                }
            }
        }
        filter
    }

    /// Bring the field in line with an applied snapshot.
    ///
    /// `applied_seq` is the submit the snapshot answers: a local change
    /// carried by that submit or an earlier one is resolved, a newer one
    /// keeps being shown.
    pub fn reconcile_snapshot(&mut self, snapshot: &ExplorerSnapshot, applied_seq: u64) {
        if let FieldKind::Choice(dimension) = self.kind {
            self.options = snapshot.options(dimension).to_vec();
        }
        self.preview = None;

        let server = self.server_contribution(snapshot);
        let keep_local = match self.pending {
            Pending::Local { seq: Some(seq) } if seq <= applied_seq => {
                if server == self.contribution {
                    self.pending = Pending::Confirmed;
                } else {
                    info!(
                        "Filter {}: server applied {:?} instead of {:?}",
                        self.kind.name(),
                        server,
                        self.contribution
                    );
                    self.pending = Pending::Overridden;
                }
                false
            }
            Pending::Local { .. } => true,
            Pending::Overridden => {
                self.pending = Pending::Confirmed;
                false
            }
            Pending::Confirmed => false,
        };
        if !keep_local {
            self.contribution = server;
        }
        self.view = self.render(Some(snapshot));
    }

    fn render(&self, snapshot: Option<&ExplorerSnapshot>) -> FieldView {
        match self.kind {
            FieldKind::Choice(dimension) => match self.contribution.get(dimension.key()) {
                Some(value) => FieldView::Chosen {
                    label: self.option_label(value),
                },
                None if self.options.len() == 1 => FieldView::Forced {
                    label: self.options[0].label.clone(),
                },
                None => FieldView::Unset {
                    options: self.options.clone(),
                },
            },
            FieldKind::Station => {
                if self.contribution.is_empty() {
                    FieldView::AllStations
                } else {
                    FieldView::Chosen {
                        label: station_text(&self.contribution),
                    }
                }
            }
            FieldKind::DateRange => {
                let (min_placeholder, max_placeholder) = match (snapshot, &self.view) {
                    (Some(s), _) => (s.stats.datetime_min.clone(), s.stats.datetime_max.clone()),
                    (
                        None,
                        FieldView::Dates {
                            min_placeholder,
                            max_placeholder,
                            ..
                        },
                    ) => (min_placeholder.clone(), max_placeholder.clone()),
                    (None, _) => (None, None),
                };
                FieldView::Dates {
                    min: self.contribution.get("datemin").map(value_label),
                    max: self.contribution.get("datemax").map(value_label),
                    min_placeholder,
                    max_placeholder,
                }
            }
        }
    }

    fn option_label(&self, value: &Value) -> String {
        self.options
            .iter()
            .find(|o| &o.value == value)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| value_label(value))
    }
}

/// Coordinate given either as a number or as numeric text.
fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn station_text(filter: &Filter) -> String {
    STATION_KEYS
        .iter()
        .filter_map(|key| filter.get(key).map(|v| format!("{}={}", key, value_label(v))))
        .collect::<Vec<_>>()
        .join(" ")
}
