//! Flattened (tabular) projection of an [`EventLog`] and import of raw event records
//!
//! The event table has one row per event with the columns
//! [`PREFIXED_CASE_ID_NAME`], [`ACTIVITY_NAME`], [`TIMESTAMP_NAME`] and one column per attribute key.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::event_data::timestamp_utils::parse_timestamp;
use crate::error::OperationError;

use super::constants::{ACTIVITY_NAME, PREFIXED_CASE_ID_NAME, TIMESTAMP_NAME};
use super::event_log_struct::{AttributeValue, Attributes, Case, Event, EventLog};

/// One row of the flattened event table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct EventRow {
    /// Identifier of the case the event belongs to
    pub case_id: String,
    /// The event itself
    pub event: Event,
}

impl EventRow {
    /// Value of a column for this row (see [`Event::get_field`])
    pub fn get_field(&self, name: &str) -> Option<AttributeValue> {
        self.event.get_field(&self.case_id, name)
    }
}

/// Flattened event table: all events of a log, in case order then event order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct EventTable {
    /// Table rows
    pub rows: Vec<EventRow>,
}

impl EventTable {
    /// All column names: the reserved columns followed by the sorted attribute keys
    pub fn columns(&self) -> Vec<String> {
        let attribute_keys: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|r| r.event.attributes.iter().map(|a| a.key.as_str()))
            .collect();
        [PREFIXED_CASE_ID_NAME, ACTIVITY_NAME, TIMESTAMP_NAME]
            .into_iter()
            .chain(attribute_keys)
            .map(String::from)
            .collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows, e.g., for a table preview
    pub fn head(&self, n: usize) -> &[EventRow] {
        &self.rows[..n.min(self.rows.len())]
    }
}

impl EventLog {
    /// Flatten this log into an [`EventTable`]
    pub fn to_event_table(&self) -> EventTable {
        EventTable {
            rows: self
                .cases
                .iter()
                .flat_map(|c| {
                    c.events.iter().map(|e| EventRow {
                        case_id: c.id.clone(),
                        event: e.clone(),
                    })
                })
                .collect(),
        }
    }

    ///
    /// Regroup table rows into an [`EventLog`]
    ///
    /// Cases appear in the order their id is first seen; the events of each case are
    /// (stably) sorted by timestamp.
    pub fn from_event_table(table: EventTable) -> Self {
        let mut case_index: HashMap<String, usize> = HashMap::new();
        let mut cases: Vec<Case> = Vec::new();
        for row in table.rows {
            let index = *case_index.entry(row.case_id.clone()).or_insert_with(|| {
                cases.push(Case::new(row.case_id.clone()));
                cases.len() - 1
            });
            cases[index].events.push(row.event);
        }
        cases.iter_mut().for_each(Case::sort_by_timestamp);
        EventLog::from_cases(cases)
    }
}

/// Raw event record as handed over by an import collaborator (e.g., a parsed CSV row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RawEventRecord {
    /// Case identifier
    pub case_id: String,
    /// Activity name
    pub activity: String,
    /// Unparsed timestamp
    pub timestamp: String,
    /// Additional attributes
    #[serde(default)]
    pub attributes: Attributes,
}

/// Options for [`import_event_records`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordImportOptions {
    /// Custom `chrono` date format tried before the built-in formats
    pub date_format: Option<String>,
}

/// Outcome of [`import_event_records`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ImportReport {
    /// Number of events that made it into the log
    pub imported_events: usize,
    /// Number of rows dropped because their timestamp could not be parsed
    pub malformed_timestamps: usize,
    /// Number of rows dropped because the case id or activity was empty
    pub missing_identifiers: usize,
}

impl ImportReport {
    /// Total number of dropped rows
    pub fn dropped(&self) -> usize {
        self.malformed_timestamps + self.missing_identifiers
    }
}

///
/// Build an [`EventLog`] from raw records
///
/// Rows with unparsable timestamps or empty case ids/activities are dropped and counted in the returned [`ImportReport`].
/// If no row survives, [`OperationError::MalformedTimestamp`] is returned.
///
/// ```rust
/// use log_workbench::core::event_data::case_centric::{import_event_records, RawEventRecord, RecordImportOptions};
///
/// let records = vec![
///     RawEventRecord { case_id: "1".into(), activity: "A".into(), timestamp: "2024-01-01 08:00:00".into(), attributes: vec![] },
///     RawEventRecord { case_id: "1".into(), activity: "B".into(), timestamp: "yesterday".into(), attributes: vec![] },
/// ];
/// let (log, report) = import_event_records(records, &RecordImportOptions::default()).unwrap();
/// assert_eq!(log.event_count(), 1);
/// assert_eq!(report.malformed_timestamps, 1);
/// ```
pub fn import_event_records<I: IntoIterator<Item = RawEventRecord>>(
    records: I,
    options: &RecordImportOptions,
) -> Result<(EventLog, ImportReport), OperationError> {
    let mut report = ImportReport::default();
    let mut rows: Vec<EventRow> = Vec::new();
    for record in records {
        if record.case_id.trim().is_empty() || record.activity.trim().is_empty() {
            report.missing_identifiers += 1;
            continue;
        }
        let timestamp: DateTime<FixedOffset> =
            match parse_timestamp(&record.timestamp, options.date_format.as_deref()) {
                Some(ts) => ts,
                None => {
                    report.malformed_timestamps += 1;
                    continue;
                }
            };
        rows.push(EventRow {
            case_id: record.case_id,
            event: Event {
                activity: record.activity,
                timestamp,
                attributes: record.attributes,
            },
        });
    }
    report.imported_events = rows.len();

    if report.dropped() > 0 {
        tracing::warn!(
            malformed_timestamps = report.malformed_timestamps,
            missing_identifiers = report.missing_identifiers,
            "dropped event records during import"
        );
    }
    if rows.is_empty() && report.dropped() > 0 {
        return Err(OperationError::MalformedTimestamp {
            dropped: report.dropped(),
        });
    }
    Ok((EventLog::from_event_table(EventTable { rows }), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::event_log_struct::EditableAttributes;
    use crate::test_utils::{sample_log, ts};

    fn record(case_id: &str, activity: &str, timestamp: &str) -> RawEventRecord {
        RawEventRecord {
            case_id: case_id.to_string(),
            activity: activity.to_string(),
            timestamp: timestamp.to_string(),
            attributes: Attributes::new(),
        }
    }

    #[test]
    fn test_table_round_trip_keeps_case_order() {
        let log = sample_log();
        let table = log.to_event_table();
        assert_eq!(table.len(), 7);
        assert_eq!(table.rows[0].case_id, "C1");
        assert_eq!(table.rows[3].case_id, "C2");
        assert_eq!(EventLog::from_event_table(table), log);
    }

    #[test]
    fn test_from_event_table_sorts_and_groups() {
        let table = EventTable {
            rows: vec![
                EventRow {
                    case_id: "x".into(),
                    event: Event::new("late", ts(10)),
                },
                EventRow {
                    case_id: "y".into(),
                    event: Event::new("only", ts(3)),
                },
                EventRow {
                    case_id: "x".into(),
                    event: Event::new("early", ts(1)),
                },
            ],
        };
        let log = EventLog::from_event_table(table);
        assert_eq!(log.cases.len(), 2);
        assert_eq!(log.cases[0].id, "x");
        assert_eq!(log.cases[0].activity_sequence(), vec!["early", "late"]);
    }

    #[test]
    fn test_columns() {
        let mut log = sample_log();
        log.cases[0].events[0]
            .attributes
            .set_value("org:resource", "Alice".into());
        let columns = log.to_event_table().columns();
        assert_eq!(
            columns,
            vec![
                "case:concept:name",
                "concept:name",
                "time:timestamp",
                "org:resource"
            ]
        );
    }

    #[test]
    fn test_import_reports_dropped_rows() {
        let (log, report) = import_event_records(
            vec![
                record("1", "A", "2024-01-01 08:00:00"),
                record("1", "B", "2024-01-01 07:00:00"),
                record("2", "A", "garbage"),
                record("", "A", "2024-01-01 08:00:00"),
            ],
            &RecordImportOptions::default(),
        )
        .unwrap();
        assert_eq!(log.cases.len(), 1);
        assert_eq!(log.cases[0].activity_sequence(), vec!["B", "A"]);
        assert_eq!(
            report,
            ImportReport {
                imported_events: 2,
                malformed_timestamps: 1,
                missing_identifiers: 1,
            }
        );
    }

    #[test]
    fn test_import_all_malformed() {
        let res = import_event_records(
            vec![record("1", "A", "?"), record("2", "B", "??")],
            &RecordImportOptions::default(),
        );
        assert_eq!(res, Err(OperationError::MalformedTimestamp { dropped: 2 }));
    }

    #[test]
    fn test_import_custom_format() {
        let (log, report) = import_event_records(
            vec![record("1", "A", "06/10/2023 09:30")],
            &RecordImportOptions {
                date_format: Some("%d/%m/%Y %H:%M".to_string()),
            },
        )
        .unwrap();
        assert_eq!(report.dropped(), 0);
        assert_eq!(log.event_count(), 1);
    }
}
