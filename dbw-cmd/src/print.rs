//! Text output of the CLI commands.

use crate::explore::CliSession;
use dbw_api::rows::value_text;
use dbw_api::{StationData, ValueRow};
use dbw_sync::{FieldKind, FieldView, FilterField, Pending};
use std::fmt::Write as _;
use std::io;

fn field_title(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Choice(dimension) => dimension.title(),
        FieldKind::Station => "Station",
        FieldKind::DateRange => "Date",
    }
}

fn field_text(field: &FilterField) -> String {
    let text = match field.view() {
        FieldView::Forced { label } => format!("{} (only choice)", label),
        FieldView::Unset { options } => format!("any ({} choices)", options.len()),
        FieldView::Chosen { label } => label.clone(),
        FieldView::AllStations => "all".to_string(),
        FieldView::Dates {
            min,
            max,
            min_placeholder,
            max_placeholder,
        } => {
            let bound = |value: &Option<String>, hint: &Option<String>| match (value, hint) {
                (Some(v), _) => v.clone(),
                (None, Some(h)) => format!("[{}]", h),
                (None, None) => "-".to_string(),
            };
            format!("{} .. {}", bound(min, min_placeholder), bound(max, max_placeholder))
        }
    };
    match field.pending() {
        Pending::Overridden => format!("{} (changed by the server)", text),
        Pending::Local { .. } => format!("{} (not applied)", text),
        Pending::Confirmed => text,
    }
}

/// Filter fields, station counts and value count.
pub fn explorer_summary(session: &CliSession) -> String {
    let mut out = String::new();
    for field in session.coordinator().fields() {
        let _ = writeln!(out, "{:<11} {}", format!("{}:", field_title(field.kind())), field_text(field));
    }
    let store = session.explorer_map().store();
    let matching = store.current().count();
    let _ = writeln!(
        out,
        "Stations:   {} matching, {} other",
        matching,
        store.len() - matching
    );
    let _ = writeln!(out, "Values:     {}", session.total_count());
    if let Some(cmdline) = session
        .snapshot()
        .and_then(|s| s.filter_cmdline.as_deref())
        .filter(|c| !c.is_empty())
    {
        let _ = writeln!(out, "Query:      {}", cmdline);
    }
    out
}

fn tuple_text(values: &[Option<i64>]) -> String {
    values
        .iter()
        .map(|v| v.map(|n| n.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

/// Rows as CSV, with a header line.
pub fn write_rows<W: io::Write>(rows: &[ValueRow], out: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["report", "station", "varcode", "level", "trange", "datetime", "value"])?;
    for row in rows {
        writer.write_record([
            row.report.clone(),
            row.station_id.to_string(),
            row.varcode.clone(),
            tuple_text(&row.level),
            tuple_text(&row.trange),
            row.datetime.clone().unwrap_or_default(),
            value_text(&row.value),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn station_summary(data: &StationData) -> String {
    let mut out = String::new();
    match &data.station {
        Some(info) => {
            let _ = writeln!(
                out,
                "Station {} ({}) at {:.5},{:.5}{}",
                info.id,
                info.rep_memo,
                info.lat,
                info.lon,
                info.ident.as_deref().map(|i| format!(" ident {}", i)).unwrap_or_default()
            );
        }
        None => {
            let _ = writeln!(out, "Station not found");
        }
    }
    for row in &data.rows {
        let _ = writeln!(out, "  {} = {}", row.varcode, value_text(&row.value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbw_api::ExplorerSnapshot;
    use dbw_sync::{Completion, ExplorerConfig, ExplorerSession, RecordingLayer};
    use serde_json::json;

    #[test]
    fn test_explorer_summary() {
        let snapshot: ExplorerSnapshot = serde_json::from_value(json!({
            "filter": {"var": "B12101"},
            "filter_cmdline": "var=B12101",
            "stations": [["synop", 1, 45.0, 9.0, null]],
            "stations_disabled": [["synop", 2, 46.0, 10.0, null]],
            "rep_memo": ["synop"],
            "var": [["B12101", "Temperature"]],
            "level": [],
            "trange": [],
            "stats": {"count": 7, "datetime_min": "2020-01-01 00:00:00", "datetime_max": "2020-12-31 23:59:59"}
        }))
        .unwrap();
        let mut session = ExplorerSession::new(ExplorerConfig::default(), RecordingLayer::new(), RecordingLayer::new());
        session.complete(Completion::Init(Ok(snapshot)));

        let text = explorer_summary(&session);
        assert!(text.contains("Station:    all\n"), "{}", text);
        assert!(text.contains("Report:     synop (only choice)\n"), "{}", text);
        assert!(text.contains("Variable:   Temperature\n"), "{}", text);
        assert!(text.contains("Level:      any (0 choices)\n"), "{}", text);
        assert!(text.contains("Date:       [2020-01-01 00:00:00] .. [2020-12-31 23:59:59]\n"), "{}", text);
        assert!(text.contains("Stations:   1 matching, 1 other\n"), "{}", text);
        assert!(text.contains("Values:     7\n"), "{}", text);
        assert!(text.contains("Query:      var=B12101\n"), "{}", text);
    }

    #[test]
    fn test_rows_as_csv() {
        let rows: Vec<ValueRow> = serde_json::from_value(json!([{
            "i": 1, "r": "synop", "s": 1, "c": "B12101", "l": [103, 2000, null, null],
            "t": [254, 0, 0], "d": "2020-01-01 00:00:00", "v": 273.15, "vt": "decimal"
        }]))
        .unwrap();
        let mut out = Vec::new();
        write_rows(&rows, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "report,station,varcode,level,trange,datetime,value\n\
             synop,1,B12101,\"103,2000,,\",\"254,0,0\",2020-01-01 00:00:00,273.15\n"
        );
    }

    #[test]
    fn test_missing_station() {
        let data = StationData {
            station: None,
            rows: Vec::new(),
        };
        assert_eq!(station_summary(&data), "Station not found\n");
    }
}
