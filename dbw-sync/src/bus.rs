//! Intents exchanged between components.
//!
//! Components never hold references into each other: whatever one of them
//! needs to tell the others is emitted here as an `Intent` and routed by the
//! session.

use crate::edit::EditRecord;
use crate::geo::GeoBounds;
use crate::station::StationKey;
use dbw_api::{AttrRow, ExplorerSnapshot, StationData, ValueRow, VarData};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// A station marker was clicked.
    StationSelected(StationKey),
    /// A rectangle was dragged on the map; `finished` is false while dragging.
    BoundsSelected { bounds: GeoBounds, finished: bool },
    /// A filter field changed its contribution.
    FilterChanged,
    /// A snapshot was applied.
    ExplorerUpdated(ExplorerSnapshot),
    /// New value rows for the current filter.
    DataUpdated(Vec<ValueRow>),
    /// A value row or station variable was clicked.
    DataSelected(VarData),
    DataLimitChanged(Option<u32>),
    ValueEditCommitted(EditRecord),
    StationDataUpdated(StationData),
    /// Attributes of a variable were loaded or replaced.
    ValueUpdated { var_data: VarData, attrs: Vec<AttrRow> },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::StationSelected(_) => "station-selected",
            Intent::BoundsSelected { .. } => "bounding-box-selected",
            Intent::FilterChanged => "filter-changed",
            Intent::ExplorerUpdated(_) => "explorer-updated",
            Intent::DataUpdated(_) => "data-updated",
            Intent::DataSelected(_) => "data-selected",
            Intent::DataLimitChanged(_) => "data-limit-changed",
            Intent::ValueEditCommitted(_) => "value-edit-committed",
            Intent::StationDataUpdated(_) => "station-data-updated",
            Intent::ValueUpdated { .. } => "value-updated",
        }
    }
}

/// FIFO queue of emitted intents.
#[derive(Debug, Default)]
pub struct EventBus {
    intents: VecDeque<Intent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            intents: VecDeque::new(),
        }
    }

    pub fn emit(&mut self, intent: Intent) {
        log::debug!("Intent {}", intent.name());
        self.intents.push_back(intent);
    }

    pub fn pending(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn pop(&mut self) -> Option<Intent> {
        self.intents.pop_front()
    }

    pub fn drain(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.intents).into()
    }
}
