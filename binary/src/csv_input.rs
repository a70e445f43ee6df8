//! Reading event logs from CSV or JSON files

use std::{io::Read, path::Path};

use anyhow::{bail, Context};
use log_workbench::core::event_data::case_centric::{
    constants::{ACTIVITY_NAME, PREFIXED_CASE_ID_NAME, TIMESTAMP_NAME},
    import_event_records, Attribute, EventLog, ImportReport, RawEventRecord, RecordImportOptions,
};

/// Which CSV columns hold the case id, activity and timestamp
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub case_column: String,
    pub activity_column: String,
    pub timestamp_column: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            case_column: PREFIXED_CASE_ID_NAME.to_string(),
            activity_column: ACTIVITY_NAME.to_string(),
            timestamp_column: TIMESTAMP_NAME.to_string(),
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> anyhow::Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| format!("Missing required column: {name}"))
}

/// Read a CSV event table (header row required); remaining columns become string attributes
pub fn read_csv_log(
    reader: impl Read,
    mapping: &ColumnMapping,
    options: &RecordImportOptions,
) -> anyhow::Result<(EventLog, ImportReport)> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let case_col = column_index(&headers, &mapping.case_column)?;
    let act_col = column_index(&headers, &mapping.activity_column)?;
    let ts_col = column_index(&headers, &mapping.timestamp_column)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let attributes = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != case_col && *i != act_col && *i != ts_col)
            .filter_map(|(i, key)| {
                record
                    .get(i)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| Attribute::new(key.trim(), v))
            })
            .collect();
        records.push(RawEventRecord {
            case_id: record.get(case_col).unwrap_or("").trim().to_string(),
            activity: record.get(act_col).unwrap_or("").trim().to_string(),
            timestamp: record.get(ts_col).unwrap_or("").to_string(),
            attributes,
        });
    }
    Ok(import_event_records(records, options)?)
}

/// Read a log from `path`: `.json` files hold a serialized [`EventLog`], anything else is read as CSV
pub fn read_log<P: AsRef<Path>>(
    path: P,
    mapping: &ColumnMapping,
    options: &RecordImportOptions,
) -> anyhow::Result<(EventLog, Option<ImportReport>)> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let log = log_workbench::import_event_log_json_from_path(path)
            .with_context(|| format!("Failed to read event log from {}", path.display()))?;
        if log.is_empty() {
            bail!("Event log {} has no cases", path.display());
        }
        return Ok((log, None));
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let (log, report) = read_csv_log(std::io::BufReader::new(file), mapping, options)?;
    Ok((log, Some(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log_workbench::core::event_data::case_centric::AttributeValue;
    use std::io::Write;

    const ORDERS: &str = "\
case,step,when,who
1,register,2024-03-01 08:00:00,ann
1,check,2024-03-01 08:10:00,
2,register,2024-03-02 08:00:00,bob
2,check,not a date,bob
";

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            case_column: "case".into(),
            activity_column: "step".into(),
            timestamp_column: "when".into(),
        }
    }

    #[test]
    fn test_read_csv() {
        let (log, report) =
            read_csv_log(ORDERS.as_bytes(), &mapping(), &RecordImportOptions::default()).unwrap();
        assert_eq!(report.imported_events, 3);
        assert_eq!(report.malformed_timestamps, 1);
        assert_eq!(log.cases.len(), 2);
        let first = &log.cases[0].events[0];
        assert_eq!(first.get_field("1", "who"), Some(AttributeValue::from("ann")));
        // empty cells are not turned into attributes
        assert_eq!(log.cases[0].events[1].attributes.len(), 0);
    }

    #[test]
    fn test_missing_column() {
        let err = read_csv_log(
            ORDERS.as_bytes(),
            &ColumnMapping::default(),
            &RecordImportOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("case:concept:name"));
    }

    #[test]
    fn test_read_log_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("orders.csv");
        std::fs::File::create(&csv_path)
            .unwrap()
            .write_all(ORDERS.as_bytes())
            .unwrap();
        let (log, report) = read_log(&csv_path, &mapping(), &RecordImportOptions::default()).unwrap();
        assert!(report.is_some());

        let json_path = dir.path().join("orders.json");
        log_workbench::export_event_log_json_path(&log, &json_path).unwrap();
        let (reread, report) =
            read_log(&json_path, &mapping(), &RecordImportOptions::default()).unwrap();
        assert_eq!(reread, log);
        assert!(report.is_none());
    }
}
