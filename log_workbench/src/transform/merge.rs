//! Merging and aggregating activity occurrences
use std::collections::HashSet;

use crate::core::event_data::case_centric::{Case, EditableAttributes, EventLog};
use crate::error::OperationError;

use super::{ensure_attribute_column, joined_unique_values, KeepStrategy};

/// Index of the representative among `matched` (indices in timestamp order)
fn representative(matched: &[usize], strategy: KeepStrategy) -> Option<usize> {
    match strategy {
        KeepStrategy::First => matched.first().copied(),
        KeepStrategy::Last => matched.last().copied(),
    }
}

///
/// Merge all events of the `sources` activities into one `target` event per case
///
/// Per case, the first or last (by timestamp) matching event is kept, renamed to `target`, and all other
/// matching events are dropped. Each of the listed `fields` of the kept event is replaced by the
/// `|`-joined sorted unique values of that field over all merged events.
/// Cases without matching events are unchanged.
pub fn merge_activities(
    log: &EventLog,
    sources: &[String],
    target: &str,
    strategy: KeepStrategy,
    fields: &[String],
) -> Result<EventLog, OperationError> {
    log.require_columns(fields)?;
    fields
        .iter()
        .try_for_each(|f| ensure_attribute_column(f))?;
    let sources: HashSet<&str> = sources.iter().map(String::as_str).collect();

    let cases = log
        .cases
        .iter()
        .map(|case| {
            let matched: Vec<usize> = case
                .events
                .iter()
                .enumerate()
                .filter(|(_, e)| sources.contains(e.activity.as_str()))
                .map(|(i, _)| i)
                .collect();
            let Some(keep) = representative(&matched, strategy) else {
                return case.clone();
            };
            let mut merged = case.events[keep].clone();
            merged.activity = target.to_string();
            for field in fields {
                let joined = joined_unique_values(
                    &case.id,
                    matched.iter().map(|&i| &case.events[i]),
                    &[field.as_str()],
                );
                merged.attributes.set_value(field, joined);
            }
            let mut merged = Some(merged);
            Case {
                id: case.id.clone(),
                events: case
                    .events
                    .iter()
                    .enumerate()
                    .filter_map(|(i, e)| {
                        if i == keep {
                            merged.take()
                        } else if sources.contains(e.activity.as_str()) {
                            None
                        } else {
                            Some(e.clone())
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    Ok(EventLog::from_cases(cases))
}

///
/// Collapse the occurrences of the `target` activity into one event per case
///
/// The first or last occurrence is kept. For the requested `fields`, the joined unique values over all
/// occurrences are written back into each field, or (if `new_column` is given) the values of all
/// requested fields are joined into that single new column. Other attributes of the kept event are untouched.
/// Cases with at most one occurrence of `target` are unchanged.
pub fn aggregate_activity(
    log: &EventLog,
    target: &str,
    strategy: KeepStrategy,
    fields: &[String],
    new_column: Option<&str>,
) -> Result<EventLog, OperationError> {
    log.require_columns(fields)?;
    match new_column {
        Some(column) => ensure_attribute_column(column)?,
        None => fields
            .iter()
            .try_for_each(|f| ensure_attribute_column(f))?,
    }

    let cases = log
        .cases
        .iter()
        .map(|case| {
            let matched: Vec<usize> = case
                .events
                .iter()
                .enumerate()
                .filter(|(_, e)| e.activity == target)
                .map(|(i, _)| i)
                .collect();
            if matched.len() <= 1 {
                return case.clone();
            }
            let Some(keep) = representative(&matched, strategy) else {
                return case.clone();
            };
            let occurrences = || matched.iter().map(|&i| &case.events[i]);
            let mut aggregated = case.events[keep].clone();
            match new_column {
                Some(column) => {
                    let field_names: Vec<&str> = fields.iter().map(String::as_str).collect();
                    let joined = joined_unique_values(&case.id, occurrences(), &field_names);
                    aggregated.attributes.set_value(column, joined);
                }
                None => {
                    for field in fields {
                        let joined =
                            joined_unique_values(&case.id, occurrences(), &[field.as_str()]);
                        aggregated.attributes.set_value(field, joined);
                    }
                }
            }
            let mut aggregated = Some(aggregated);
            Case {
                id: case.id.clone(),
                events: case
                    .events
                    .iter()
                    .enumerate()
                    .filter_map(|(i, e)| {
                        if i == keep {
                            aggregated.take()
                        } else if e.activity == target {
                            None
                        } else {
                            Some(e.clone())
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    Ok(EventLog::from_cases(cases))
}

/// Keep only the first occurrence of every activity in each case
pub fn deduplicate_first(log: &EventLog) -> EventLog {
    EventLog::from_cases(
        log.cases
            .iter()
            .map(|case| {
                let mut seen: HashSet<&str> = HashSet::new();
                Case {
                    id: case.id.clone(),
                    events: case
                        .events
                        .iter()
                        .filter(|e| seen.insert(e.activity.as_str()))
                        .cloned()
                        .collect(),
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_data::case_centric::AttributeValue;
    use crate::test_utils::{order_log, sample_log, ts};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn resource(log: &EventLog, case: &str, index: usize) -> AttributeValue {
        log.get_case(case).unwrap().events[index]
            .attributes
            .get_by_key("org:resource")
            .map(|a| a.value.clone())
            .unwrap_or(AttributeValue::Null)
    }

    #[test]
    fn test_merge_first() {
        let merged = merge_activities(
            &order_log(),
            &strings(&["Check", "Approve"]),
            "Review",
            KeepStrategy::First,
            &strings(&["org:resource"]),
        )
        .unwrap();
        let o1 = merged.get_case("o1").unwrap();
        assert_eq!(o1.activity_sequence(), vec!["Create", "Review", "Ship"]);
        assert_eq!(o1.events[1].timestamp, ts(10));
        assert_eq!(resource(&merged, "o1", 1), AttributeValue::from("Ann|Bob|Cid"));
        assert_eq!(
            merged.get_case("o2").unwrap().activity_sequence(),
            vec!["Create", "Review", "Reject"]
        );
        assert_eq!(resource(&merged, "o2", 1), AttributeValue::from("Bob"));
        // other attributes of the representative are kept
        assert_eq!(
            o1.events[1].attributes.get_by_key("cost").map(|a| &a.value),
            Some(&AttributeValue::Int(20))
        );
    }

    #[test]
    fn test_merge_invariant() {
        for strategy in [KeepStrategy::First, KeepStrategy::Last] {
            let merged = merge_activities(
                &order_log(),
                &strings(&["Check", "Approve", "Ship"]),
                "Ship",
                strategy,
                &[],
            )
            .unwrap();
            for case in &merged.cases {
                assert!(case.events.iter().filter(|e| e.activity == "Ship").count() <= 1);
                assert!(case
                    .events
                    .iter()
                    .all(|e| e.activity != "Check" && e.activity != "Approve"));
            }
        }
    }

    #[test]
    fn test_merge_last_and_untouched_cases() {
        let merged = merge_activities(
            &order_log(),
            &strings(&["Check", "Reject"]),
            "Check",
            KeepStrategy::Last,
            &[],
        )
        .unwrap();
        let o1 = merged.get_case("o1").unwrap();
        assert_eq!(o1.activity_sequence(), vec!["Create", "Check", "Approve", "Ship"]);
        assert_eq!(o1.events[1].timestamp, ts(20));
        assert_eq!(
            merged.get_case("o2").unwrap().activity_sequence(),
            vec!["Create", "Check"]
        );
        assert_eq!(merged.get_case("o3"), order_log().get_case("o3"));
    }

    #[test]
    fn test_merge_unknown_field() {
        assert_eq!(
            merge_activities(
                &order_log(),
                &strings(&["Check"]),
                "X",
                KeepStrategy::First,
                &strings(&["department"]),
            ),
            Err(OperationError::FieldNotFound {
                field: "department".to_string()
            })
        );
    }

    #[test]
    fn test_aggregate_into_new_column() {
        let aggregated = aggregate_activity(
            &order_log(),
            "Check",
            KeepStrategy::Last,
            &strings(&["cost"]),
            Some("all_costs"),
        )
        .unwrap();
        let o1 = aggregated.get_case("o1").unwrap();
        assert_eq!(o1.activity_sequence(), vec!["Create", "Check", "Approve", "Ship"]);
        let check = &o1.events[1];
        assert_eq!(check.timestamp, ts(20));
        assert_eq!(
            check.attributes.get_by_key("all_costs").map(|a| &a.value),
            Some(&AttributeValue::from("20|30"))
        );
        assert_eq!(
            check.attributes.get_by_key("cost").map(|a| &a.value),
            Some(&AttributeValue::Int(30))
        );
        // single occurrence: unchanged
        assert_eq!(aggregated.get_case("o2"), order_log().get_case("o2"));
    }

    #[test]
    fn test_aggregate_in_place() {
        let aggregated = aggregate_activity(
            &order_log(),
            "Check",
            KeepStrategy::First,
            &strings(&["org:resource", "cost"]),
            None,
        )
        .unwrap();
        let check = &aggregated.get_case("o1").unwrap().events[1];
        assert_eq!(check.timestamp, ts(10));
        assert_eq!(resource(&aggregated, "o1", 1), AttributeValue::from("Bob|Cid"));
        assert_eq!(
            check.attributes.get_by_key("cost").map(|a| &a.value),
            Some(&AttributeValue::from("20|30"))
        );
    }

    #[test]
    fn test_aggregate_cannot_overwrite_reserved_columns() {
        assert!(matches!(
            aggregate_activity(
                &order_log(),
                "Check",
                KeepStrategy::First,
                &strings(&["concept:name"]),
                None,
            ),
            Err(OperationError::InvalidOperationParameters(_))
        ));
        // reading them into a new column is fine
        let aggregated = aggregate_activity(
            &order_log(),
            "Check",
            KeepStrategy::First,
            &strings(&["org:resource", "case:concept:name"]),
            Some("who"),
        )
        .unwrap();
        let check = &aggregated.get_case("o1").unwrap().events[1];
        assert_eq!(
            check.attributes.get_by_key("who").map(|a| &a.value),
            Some(&AttributeValue::from("Bob|Cid|o1"))
        );
    }

    #[test]
    fn test_deduplicate_first() {
        let log = deduplicate_first(&sample_log());
        let c1 = log.get_case("C1").unwrap();
        assert_eq!(c1.activity_sequence(), vec!["A", "B"]);
        assert_eq!(c1.events[0].timestamp, ts(0));
        let c2 = log.get_case("C2").unwrap();
        assert_eq!(c2.activity_sequence(), vec!["A", "B"]);
        assert_eq!(c2.events[1].timestamp, ts(1));
    }
}
