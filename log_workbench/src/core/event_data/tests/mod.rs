use crate::core::event_data::case_centric::{
    import_event_records, Attribute, AttributeValue, RawEventRecord, RecordImportOptions,
};
use crate::core::EventLog;
use crate::discovery::case_centric::dfg::{build_layout, discover_dfg};
use crate::pipeline::{Operation, OperationPipeline};
use crate::transform::KeepStrategy;
use crate::{import_event_log_json_from_slice, OperationError};

mod pipeline_scenario_tests;

fn records(rows: &[(&str, &str, &str, &str)]) -> Vec<RawEventRecord> {
    rows.iter()
        .map(|(case_id, activity, timestamp, resource)| RawEventRecord {
            case_id: case_id.to_string(),
            activity: activity.to_string(),
            timestamp: timestamp.to_string(),
            attributes: vec![Attribute::new("org:resource", *resource)],
        })
        .collect()
}

fn import(rows: &[(&str, &str, &str, &str)]) -> EventLog {
    let (log, report) = import_event_records(records(rows), &RecordImportOptions::default()).unwrap();
    assert_eq!(report.dropped(), 0);
    log
}

#[test]
fn test_imported_log_is_valid() {
    let log = import(&[
        ("2", "A", "2024-03-01 10:00:00", "x"),
        ("1", "B", "2024-03-01T09:30:00+01:00", "y"),
        ("1", "A", "2024-03-01T08:00:00Z", "x"),
    ]);
    log.validate().unwrap();
    assert_eq!(log.cases[0].id, "2");
    assert_eq!(log.get_case("1").unwrap().activity_sequence(), vec!["A", "B"]);
}

#[test]
fn test_import_all_rows_malformed() {
    let result = import_event_records(
        records(&[("1", "A", "yesterday", "x"), ("1", "B", "", "x")]),
        &RecordImportOptions::default(),
    );
    assert_eq!(result, Err(OperationError::MalformedTimestamp { dropped: 2 }));
}

#[test]
fn test_custom_date_format() {
    let options = RecordImportOptions {
        date_format: Some("%d.%m.%Y %H:%M".to_string()),
    };
    let (log, report) = import_event_records(
        records(&[("1", "A", "01.03.2024 10:00", "x"), ("1", "B", "02.03.2024 09:00", "x")]),
        &options,
    )
    .unwrap();
    assert_eq!(report.imported_events, 2);
    assert_eq!(log.cases[0].duration_seconds(), Some(23.0 * 3600.0));
}

#[test]
fn test_json_round_trip() {
    let log = crate::test_utils::order_log();
    let bytes = serde_json::to_vec(&log).unwrap();
    assert_eq!(import_event_log_json_from_slice(&bytes).unwrap(), log);
    assert!(import_event_log_json_from_slice(b"{\"cases\": 3}").is_err());
}

#[test]
fn test_import_pipeline_graph() {
    let log = import(&[
        ("1", "register", "2024-03-01 08:00:00", "ann"),
        ("1", "check", "2024-03-01 08:10:00", "bob"),
        ("1", "check", "2024-03-01 08:20:00", "bob"),
        ("1", "pay", "2024-03-01 09:00:00", "ann"),
        ("2", "register", "2024-03-02 08:00:00", "ann"),
        ("2", "pay", "2024-03-02 08:30:00", "cid"),
    ]);
    let mut pipeline = OperationPipeline::new(log).unwrap();
    let dfg = discover_dfg(pipeline.current_log());
    assert_eq!(dfg.df_frequency("check", "check"), 1);

    pipeline
        .append(Operation::RemoveSelfLoops {
            strategy: KeepStrategy::First,
        })
        .unwrap();
    let dfg = discover_dfg(pipeline.current_log());
    assert_eq!(dfg.df_frequency("check", "check"), 0);
    assert_eq!(dfg.activity_frequency("check"), 1);

    let graph = build_layout(pipeline.current_log(), 100.0, 100.0, &Default::default());
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.start_activity.as_deref(), Some("register"));
    assert!(graph.edges.iter().all(|e| e.from != e.to));

    let check = &pipeline.current_log().cases[0].events[1];
    assert_eq!(check.get_field("1", "org:resource"), Some(AttributeValue::from("bob")));
}
