use crate::core::event_data::case_centric::AttributeValue;
use crate::discovery::case_centric::dfg::discover_dfg;
use crate::pipeline::{replay, Operation, OperationPipeline, PipelineOptions, SnapshotPolicy};
use crate::test_utils::{order_log, sample_log, ts};
use crate::transform::{ComparisonOperator, ConditionLevel, KeepStrategy};
use crate::OperationError;

fn timeline(pipeline: &OperationPipeline, case: &str) -> Vec<(String, i64)> {
    pipeline
        .current_log()
        .get_case(case)
        .unwrap()
        .events
        .iter()
        .map(|e| (e.activity.clone(), (e.timestamp - ts(0)).num_minutes()))
        .collect()
}

fn steps(items: &[(&str, i64)]) -> Vec<(String, i64)> {
    items.iter().map(|(a, m)| (a.to_string(), *m)).collect()
}

#[test]
fn test_self_loop_scenario_through_pipeline() {
    let mut pipeline = OperationPipeline::new(sample_log()).unwrap();
    pipeline
        .append(Operation::RemoveSelfLoops {
            strategy: KeepStrategy::First,
        })
        .unwrap();
    assert_eq!(timeline(&pipeline, "C1"), steps(&[("A", 0), ("B", 2)]));
    assert_eq!(timeline(&pipeline, "C2"), steps(&[("A", 0), ("B", 1)]));

    pipeline.undo().unwrap();
    pipeline
        .append(Operation::RemoveSelfLoops {
            strategy: KeepStrategy::Last,
        })
        .unwrap();
    assert_eq!(timeline(&pipeline, "C1"), steps(&[("A", 1), ("B", 2)]));
    assert_eq!(timeline(&pipeline, "C2"), steps(&[("A", 0), ("B", 3)]));
}

#[test]
fn test_case_length_scenario() {
    let mut pipeline = OperationPipeline::new(sample_log()).unwrap();
    pipeline
        .append(Operation::FilterCaseLength { min_events: 3 })
        .unwrap();
    assert_eq!(pipeline.current_log(), &sample_log());
    pipeline.undo().unwrap();
    pipeline
        .append(Operation::FilterCaseLength { min_events: 4 })
        .unwrap();
    let ids: Vec<&str> = pipeline
        .current_log()
        .cases
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["C2"]);

    pipeline
        .append(Operation::RemoveSelfLoops {
            strategy: KeepStrategy::First,
        })
        .unwrap();
    assert_eq!(timeline(&pipeline, "C2"), steps(&[("A", 0), ("B", 1)]));

    // collapsing first shortens C2 below the length threshold
    let before = pipeline.operations().to_vec();
    assert_eq!(
        pipeline.reorder(1, 0),
        Err(OperationError::EmptyLogAfterOperation {
            index: 1,
            description: "Keep cases with at least 4 events".to_string()
        })
    );
    assert_eq!(pipeline.operations(), before.as_slice());
    assert_eq!(pipeline.current_log().event_count(), 2);
}

#[test]
fn test_dfg_scenario() {
    let dfg = discover_dfg(&sample_log());
    assert_eq!(dfg.activity_frequency("A"), 3);
    assert_eq!(dfg.activity_frequency("B"), 4);
    assert_eq!(dfg.df_frequency("A", "A"), 1);
    assert_eq!(dfg.df_frequency("A", "B"), 2);
    assert_eq!(dfg.df_frequency("B", "B"), 2);
    assert_eq!(dfg.directly_follows_relations.len(), 3);
}

#[test]
fn test_order_handling_session() {
    let original = order_log();
    let mut pipeline = OperationPipeline::with_options(
        original.clone(),
        PipelineOptions {
            snapshot_policy: SnapshotPolicy::OperationsOnly,
            max_history: Some(10),
        },
    )
    .unwrap();
    let requests = [
        r#"{"kind": "FilterByColumnCondition", "parameters": {"level": "event", "column": "org:resource",
            "op": "==", "value": {"type": "String", "content": "Dan"}}}"#,
        r#"{"kind": "MergeActivities", "parameters": {"sources": ["Check", "Approve"], "target": "Review",
            "strategy": "last", "fields": ["org:resource"]}}"#,
        r#"{"kind": "Custom", "parameters": {"description": "exported preview"}}"#,
    ];
    for request in requests {
        pipeline
            .append(Operation::from_request_json(request).unwrap())
            .unwrap();
    }
    assert_eq!(
        pipeline.descriptions(),
        vec![
            "Delete events where org:resource == Dan",
            "Merge Check + Approve → Review (keep last; join org:resource)",
            "Custom: exported preview",
        ]
    );
    let o1 = pipeline.current_log().get_case("o1").unwrap();
    assert_eq!(o1.activity_sequence(), vec!["Create", "Review"]);
    assert_eq!(o1.events[1].timestamp, ts(30));
    assert_eq!(
        o1.events[1].get_field("o1", "org:resource"),
        Some(AttributeValue::from("Ann|Bob|Cid"))
    );
    let o2 = pipeline.current_log().get_case("o2").unwrap();
    assert_eq!(o2.activity_sequence(), vec!["Create", "Review", "Reject"]);

    // rejected requests are not recorded
    assert!(matches!(
        pipeline.append(Operation::FilterByColumnCondition {
            level: ConditionLevel::Case,
            column: "department".into(),
            op: ComparisonOperator::Equal,
            value: "x".into(),
        }),
        Err(OperationError::FieldNotFound { .. })
    ));

    let derived = pipeline.current_log().clone();
    pipeline.undo().unwrap();
    pipeline.undo().unwrap();
    assert_eq!(pipeline.operations().len(), 1);
    pipeline.redo().unwrap();
    pipeline.redo().unwrap();
    assert_eq!(pipeline.current_log(), &derived);
    assert_eq!(replay(&original, pipeline.operations()).unwrap(), derived);

    pipeline.append(Operation::Reset).unwrap();
    assert_eq!(pipeline.current_log(), &original);
    assert_eq!(pipeline.operations().len(), 4);
}
