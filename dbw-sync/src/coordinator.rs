//! Builds the aggregate filter from the fields and dispatches snapshots back
//! to them.

use crate::bus::{EventBus, Intent};
use crate::field::{FieldKind, FilterField};
use dbw_api::{Dimension, ExplorerSnapshot, Filter};
use log::{debug, warn};

/// A filter submit in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub seq: u64,
    pub filter: Filter,
}

pub struct FilterCoordinator {
    fields: Vec<FilterField>,
    issued: u64,
    applied: u64,
}

impl FilterCoordinator {
    pub fn new(fields: Vec<FilterField>) -> Self {
        Self {
            fields,
            issued: 0,
            applied: 0,
        }
    }

    /// Station field, one choice field per dimension, date range.
    pub fn with_default_fields(mobile_flag: bool) -> Self {
        let mut fields = vec![FilterField::station(mobile_flag)];
        fields.extend(Dimension::ALL.into_iter().map(FilterField::choice));
        fields.push(FilterField::date_range());
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn field(&self, kind: FieldKind) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.kind() == kind)
    }

    pub fn field_mut(&mut self, kind: FieldKind) -> Option<&mut FilterField> {
        self.fields.iter_mut().find(|f| f.kind() == kind)
    }

    /// Sequence number of the last applied submit.
    pub fn applied_seq(&self) -> u64 {
        self.applied
    }

    pub fn in_flight(&self) -> bool {
        self.issued > self.applied
    }

    /// Union of every field's contribution; later fields win on collisions.
    pub fn aggregate(&self) -> Filter {
        let mut filter = Filter::new();
        for field in &self.fields {
            for key in filter.merge(field.contribution()) {
                warn!("Filter key {} set by more than one field, {} wins", key, field.kind().name());
            }
        }
        filter
    }

    /// Start a submit of the current aggregate filter.
    pub fn begin_submit(&mut self) -> SubmitTicket {
        self.issued += 1;
        let seq = self.issued;
        for field in &mut self.fields {
            field.stamp(seq);
        }
        let filter = self.aggregate();
        debug!("Submitting filter #{}: {}", seq, filter.to_text());
        SubmitTicket { seq, filter }
    }

    fn dispatch(&mut self, snapshot: ExplorerSnapshot, bus: &mut EventBus) {
        for field in &mut self.fields {
            field.reconcile_snapshot(&snapshot, self.applied);
        }
        bus.emit(Intent::ExplorerUpdated(snapshot));
    }

    /// Snapshot returned by `init`. Ignored once the answer to a submit has
    /// been applied, since that one is newer.
    pub fn apply_initial(&mut self, snapshot: ExplorerSnapshot, bus: &mut EventBus) -> bool {
        if self.applied > 0 {
            debug!("Discarding init snapshot: filter #{} already applied", self.applied);
            return false;
        }
        self.dispatch(snapshot, bus);
        true
    }

    /// Apply the answer to a submit, unless a newer submit was already
    /// applied. Returns whether the snapshot was used.
    pub fn apply(&mut self, ticket: &SubmitTicket, snapshot: ExplorerSnapshot, bus: &mut EventBus) -> bool {
        if ticket.seq <= self.applied {
            debug!(
                "Discarding snapshot for filter #{}: #{} already applied",
                ticket.seq, self.applied
            );
            return false;
        }
        self.applied = ticket.seq;
        self.dispatch(snapshot, bus);
        true
    }

    /// A submit failed: everything stays as it is, local choices included.
    pub fn fail(&mut self, ticket: &SubmitTicket, err: &anyhow::Error) {
        warn!("Filter #{} failed: {:#}", ticket.seq, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldView, Pending};
    use serde_json::{json, Value};

    fn snapshot(body: Value) -> ExplorerSnapshot {
        serde_json::from_value(body).unwrap()
    }

    fn var_options() -> Value {
        json!([["B12101", "Temperature"], ["B13011", "Precipitation"]])
    }

    #[test]
    fn test_aggregate_merges_contributions() {
        let mut bus = EventBus::new();
        let mut coordinator = FilterCoordinator::with_default_fields(false);
        coordinator.apply_initial(snapshot(json!({"rep_memo": ["synop"], "var": var_options()})), &mut bus);
        assert!(coordinator.aggregate().is_empty());

        coordinator
            .field_mut(FieldKind::Choice(Dimension::Var))
            .unwrap()
            .select(json!("B12101"), &mut bus);
        coordinator
            .field_mut(FieldKind::DateRange)
            .unwrap()
            .set_dates("2020", "", &mut bus);
        let ticket = coordinator.begin_submit();
        assert_eq!(ticket.seq, 1);
        assert_eq!(ticket.filter.get("var"), Some(&json!("B12101")));
        assert_eq!(ticket.filter.get("datemin"), Some(&json!("2020-01-01 00:00:00")));
        assert_eq!(ticket.filter.len(), 2);
    }

    #[test]
    fn test_later_field_wins_on_collision() {
        let mut bus = EventBus::new();
        let mut coordinator =
            FilterCoordinator::new(vec![FilterField::choice(Dimension::Var), FilterField::choice(Dimension::Var)]);
        coordinator.fields[0].select(json!("B12101"), &mut bus);
        coordinator.fields[1].select(json!("B13011"), &mut bus);
        assert_eq!(coordinator.aggregate(), Filter::single("var", "B13011"));
    }

    #[test]
    fn test_stale_snapshot_is_discarded() {
        let mut bus = EventBus::new();
        let mut coordinator = FilterCoordinator::with_default_fields(false);
        let first = coordinator.begin_submit();
        let second = coordinator.begin_submit();
        assert!(coordinator.in_flight());

        assert!(coordinator.apply(&second, snapshot(json!({"var": ["B12101"]})), &mut bus));
        assert!(!coordinator.apply(&first, snapshot(json!({"var": var_options()})), &mut bus));
        assert!(!coordinator.in_flight());
        let var = coordinator.field(FieldKind::Choice(Dimension::Var)).unwrap();
        assert!(matches!(var.view(), FieldView::Forced { .. }));
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_late_init_snapshot_is_discarded() {
        let mut bus = EventBus::new();
        let mut coordinator = FilterCoordinator::with_default_fields(false);
        let ticket = coordinator.begin_submit();
        assert!(coordinator.apply(&ticket, snapshot(json!({"var": ["B12101"]})), &mut bus));
        bus.drain();

        assert!(!coordinator.apply_initial(snapshot(json!({"var": var_options()})), &mut bus));
        let var = coordinator.field(FieldKind::Choice(Dimension::Var)).unwrap();
        assert!(matches!(var.view(), FieldView::Forced { .. }));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_failure_keeps_local_choice() {
        let mut bus = EventBus::new();
        let mut coordinator = FilterCoordinator::with_default_fields(false);
        coordinator.apply_initial(snapshot(json!({"var": var_options()})), &mut bus);
        coordinator
            .field_mut(FieldKind::Choice(Dimension::Var))
            .unwrap()
            .select(json!("B13011"), &mut bus);
        let ticket = coordinator.begin_submit();
        coordinator.fail(&ticket, &anyhow::anyhow!("connection refused"));
        let var = coordinator.field(FieldKind::Choice(Dimension::Var)).unwrap();
        assert_eq!(var.pending(), Pending::Local { seq: Some(1) });
        assert_eq!(var.view().label(), Some("Precipitation"));
        assert_eq!(coordinator.aggregate(), Filter::single("var", "B13011"));
    }
}
