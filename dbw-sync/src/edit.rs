//! In-place editing of a single value or attribute.

use crate::bus::{EventBus, Intent};
use dbw_api::rows::{value_text, AttrEdit, DataEdit, StationDataEdit};
use dbw_api::{AttrRow, StationId, ValueRow, VarData, VarType, VariableRow};
use log::debug;
use serde_json::Value;

/// The cell being edited.
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    Value(ValueRow),
    StationVariable { station_id: StationId, row: VariableRow },
    Attribute { var_data: VarData, attr: AttrRow },
}

impl EditTarget {
    pub fn value(&self) -> &Value {
        match self {
            EditTarget::Value(row) => &row.value,
            EditTarget::StationVariable { row, .. } => &row.value,
            EditTarget::Attribute { attr, .. } => &attr.value,
        }
    }

    pub fn var_type(&self) -> VarType {
        match self {
            EditTarget::Value(row) => row.var_type,
            EditTarget::StationVariable { row, .. } => row.var_type,
            EditTarget::Attribute { attr, .. } => attr.var_type,
        }
    }

    pub fn varcode(&self) -> &str {
        match self {
            EditTarget::Value(row) => &row.varcode,
            EditTarget::StationVariable { row, .. } => &row.varcode,
            EditTarget::Attribute { attr, .. } => &attr.varcode,
        }
    }

    fn record(&self, value: Value) -> EditRecord {
        match self {
            EditTarget::Value(row) => EditRecord::Data(DataEdit {
                ana_id: row.station_id,
                varcode: row.varcode.clone(),
                level: row.level.clone(),
                trange: row.trange.clone(),
                datetime: row.datetime.clone(),
                vt: row.var_type,
                value,
            }),
            EditTarget::StationVariable { station_id, row } => EditRecord::StationData(StationDataEdit {
                ana_id: *station_id,
                varcode: row.varcode.clone(),
                vt: row.var_type,
                value,
            }),
            EditTarget::Attribute { var_data, attr } => EditRecord::Attr {
                var_data: var_data.clone(),
                rec: AttrEdit {
                    c: attr.varcode.clone(),
                    vt: attr.var_type,
                    vs: attr.scale,
                    v: value,
                },
            },
        }
    }
}

/// A committed edit, ready to be sent with the matching `replace_*` call.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRecord {
    Data(DataEdit),
    StationData(StationDataEdit),
    Attr { var_data: VarData, rec: AttrEdit },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    Editing,
    /// The text does not parse as the variable's type.
    Invalid(String),
    /// Sent to the server, waiting for fresh rows.
    Submitted,
    /// The server rejected the edit; the text is kept for another try.
    Failed(String),
}

/// Result of confirming the editor (Enter or leaving the field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Text unchanged: nothing to send, the editor can close.
    RolledBack,
    Submitted,
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineEdit {
    target: EditTarget,
    original: String,
    text: String,
    state: EditState,
}

impl InlineEdit {
    pub fn begin(target: EditTarget) -> Self {
        let original = value_text(target.value());
        Self {
            target,
            text: original.clone(),
            original,
            state: EditState::Editing,
        }
    }

    pub fn target(&self) -> &EditTarget {
        &self.target
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if matches!(self.state, EditState::Invalid(_)) {
            self.state = EditState::Editing;
        }
    }

    pub fn commit(&mut self, bus: &mut EventBus) -> EditOutcome {
        // Blur right after Enter confirms the same edit again
        if self.state == EditState::Submitted {
            return EditOutcome::Submitted;
        }
        if self.text == self.original {
            debug!("Edit of {} rolled back", self.target.varcode());
            return EditOutcome::RolledBack;
        }
        match self.target.var_type().parse_input(&self.text) {
            Ok(value) => {
                self.state = EditState::Submitted;
                bus.emit(Intent::ValueEditCommitted(self.target.record(value)));
                EditOutcome::Submitted
            }
            Err(e) => {
                self.state = EditState::Invalid(format!("{:#}", e));
                EditOutcome::Invalid
            }
        }
    }

    pub fn fail(&mut self, err: &anyhow::Error) {
        self.state = EditState::Failed(format!("{:#}", err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value_row() -> ValueRow {
        serde_json::from_value(json!({
            "i": 2, "r": "synop", "s": 1, "c": "B12101",
            "l": [103, 2000, null, null], "t": [254, 0, 0],
            "d": "2020-01-01 00:00:00", "v": 273.15, "vt": "decimal", "vs": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_unchanged_text_rolls_back() {
        let mut bus = EventBus::new();
        let mut edit = InlineEdit::begin(EditTarget::Value(value_row()));
        assert_eq!(edit.text(), "273.15");
        assert_eq!(edit.commit(&mut bus), EditOutcome::RolledBack);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_commit_emits_typed_record() {
        let mut bus = EventBus::new();
        let mut edit = InlineEdit::begin(EditTarget::Value(value_row()));
        edit.set_text("280.5");
        assert_eq!(edit.commit(&mut bus), EditOutcome::Submitted);
        assert_eq!(edit.state(), &EditState::Submitted);
        match bus.pop() {
            Some(Intent::ValueEditCommitted(EditRecord::Data(rec))) => {
                assert_eq!(rec.ana_id, 1);
                assert_eq!(rec.value, json!(280.5));
                assert_eq!(rec.level, vec![Some(103), Some(2000), None, None]);
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_second_commit_sends_nothing() {
        let mut bus = EventBus::new();
        let mut edit = InlineEdit::begin(EditTarget::Value(value_row()));
        edit.set_text("280.5");
        edit.commit(&mut bus);
        bus.drain();
        assert_eq!(edit.commit(&mut bus), EditOutcome::Submitted);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_invalid_text_keeps_editor_open() {
        let mut bus = EventBus::new();
        let attr = AttrRow {
            varcode: "B33007".to_string(),
            value: json!(70),
            var_type: VarType::Integer,
            scale: Some(0),
        };
        let mut edit = InlineEdit::begin(EditTarget::Attribute {
            var_data: VarData::Value(value_row()),
            attr,
        });
        edit.set_text("seventy");
        assert_eq!(edit.commit(&mut bus), EditOutcome::Invalid);
        assert!(matches!(edit.state(), EditState::Invalid(_)));
        assert_eq!(edit.text(), "seventy");
        edit.set_text("80");
        assert_eq!(edit.commit(&mut bus), EditOutcome::Submitted);
        match bus.pop() {
            Some(Intent::ValueEditCommitted(EditRecord::Attr { rec, .. })) => {
                assert_eq!(rec.c, "B33007");
                assert_eq!(rec.v, json!(80));
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_failure_keeps_text() {
        let mut bus = EventBus::new();
        let row = VariableRow {
            id: 4,
            varcode: "B01019".to_string(),
            value: json!("Bologna"),
            var_type: VarType::String,
            scale: None,
        };
        let mut edit = InlineEdit::begin(EditTarget::StationVariable { station_id: 3, row });
        edit.set_text("Bologna Urbana");
        edit.commit(&mut bus);
        edit.fail(&anyhow::anyhow!("read-only database"));
        assert_eq!(edit.text(), "Bologna Urbana");
        assert!(matches!(edit.state(), EditState::Failed(msg) if msg.contains("read-only")));
    }
}
