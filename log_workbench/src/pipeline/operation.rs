//! Serializable operation descriptors
use std::fmt::Display;

use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::event_data::case_centric::{AttributeValue, EventLog};
use crate::error::OperationError;
use crate::transform::{
    aggregate_activity, deduplicate_first, delete_by_condition, ensure_attribute_column,
    filter_by_expression, filter_by_start_end, filter_by_time_range, filter_case_duration,
    filter_case_length, filter_event_frequency, merge_activities, remove_self_loops,
    ComparisonOperator, ConditionLevel, Expression, KeepStrategy, StartEndMode,
};

///
/// One step of an operation pipeline
///
/// An operation only stores its parameters; applying it is delegated to the transform library.
/// Serialized as a request record `{"kind": ..., "parameters": {...}}`:
///
/// ```rust
/// use log_workbench::pipeline::Operation;
///
/// let op = Operation::from_request_json(
///     r#"{"kind": "FilterEventFrequency", "parameters": {"min_freq": 2}}"#,
/// )
/// .unwrap();
/// assert_eq!(op, Operation::FilterEventFrequency { min_freq: 2 });
/// assert!(Operation::from_request_json(r#"{"kind": "FilterEventFrequency"}"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "parameters")]
pub enum Operation {
    /// Drop events of activities occurring fewer than `min_freq` times
    FilterEventFrequency {
        /// Minimal number of occurrences of an activity in the whole log
        min_freq: u64,
    },
    /// Keep cases with at least `min_events` events
    FilterCaseLength {
        /// Minimal number of events per case
        min_events: usize,
    },
    /// Keep cases whose duration (seconds) lies within the (inclusive) bounds
    FilterCaseDuration {
        /// Lower bound
        #[serde(default)]
        min_sec: Option<f64>,
        /// Upper bound
        #[serde(default)]
        max_sec: Option<f64>,
    },
    /// Keep cases starting and/or ending with the given activities
    FilterByStartEnd {
        /// Required start activity
        #[serde(default)]
        start: Option<String>,
        /// Required end activity
        #[serde(default)]
        end: Option<String>,
        /// Which of the conditions are checked
        mode: StartEndMode,
    },
    /// Keep events within a time interval (inclusive)
    FilterByTimeRange {
        /// Start of the interval
        start: DateTime<FixedOffset>,
        /// End of the interval
        end: DateTime<FixedOffset>,
    },
    /// Keep event table rows matching a boolean expression
    FilterByExpression {
        /// Expression source, see [`crate::transform::expression`]
        expr: String,
    },
    /// Delete events or cases where `column op value` holds
    FilterByColumnCondition {
        /// Event or case granularity
        level: ConditionLevel,
        /// Compared column
        column: String,
        /// Comparison operator
        op: ComparisonOperator,
        /// Literal to compare with, either a plain JSON scalar or a typed attribute value
        #[serde(deserialize_with = "deserialize_literal")]
        #[schemars(with = "AttributeValue")]
        value: AttributeValue,
    },
    /// Merge the events of several activities into one event per case
    MergeActivities {
        /// Activities to merge
        sources: Vec<String>,
        /// Name of the merged activity
        target: String,
        /// Which event is kept as representative
        #[serde(default)]
        strategy: KeepStrategy,
        /// Fields receiving the joined values of all merged events
        #[serde(default)]
        fields: Vec<String>,
    },
    /// Collapse the occurrences of one activity into one event per case
    AggregateActivity {
        /// Aggregated activity
        target: String,
        /// Which occurrence is kept
        #[serde(default)]
        strategy: KeepStrategy,
        /// Fields whose values are joined
        #[serde(default)]
        agg_fields: Vec<String>,
        /// Column receiving the joined values (blank: write back into each field)
        #[serde(default)]
        new_col: Option<String>,
    },
    /// Collapse runs of directly repeated activities
    RemoveSelfLoops {
        /// Which event of a run is kept
        #[serde(default)]
        strategy: KeepStrategy,
    },
    /// Keep only the first occurrence of each activity per case
    DeduplicateFirst,
    /// Restart from the original log
    Reset,
    /// Annotation of an external step; replays as identity
    Custom {
        /// Free-text description
        description: String,
    },
}

/// Comparison literal as sent by forms (`50`, `"Cid"`, `true`, `null`) or as serialized `{"type": ..., "content": ...}`
fn deserialize_literal<'de, D>(deserializer: D) -> Result<AttributeValue, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(AttributeValue::Null),
        Value::Bool(b) => Ok(AttributeValue::Boolean(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttributeValue::Int(i)),
            None => n
                .as_f64()
                .map(AttributeValue::Float)
                .ok_or_else(|| serde::de::Error::custom(format!("unsupported number {}", n))),
        },
        Value::String(s) => Ok(AttributeValue::String(s)),
        tagged @ Value::Object(_) => serde_json::from_value(tagged).map_err(serde::de::Error::custom),
        Value::Array(_) => Err(serde::de::Error::custom(
            "comparison literal must be a number, string, boolean or null",
        )),
    }
}

/// `Some(trimmed)` for non-blank strings
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn require_name(value: &str, what: &str) -> Result<(), OperationError> {
    if value.trim().is_empty() {
        return Err(OperationError::invalid_parameters(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(())
}

fn check_bound(value: Option<f64>, what: &str) -> Result<(), OperationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(OperationError::invalid_parameters(format!(
            "{} must be a non-negative number of seconds (got {})",
            what, v
        ))),
        _ => Ok(()),
    }
}

impl Operation {
    ///
    /// Parse an operation request (`{"kind": ..., "parameters": {...}}`) and validate it
    ///
    /// Deserialization failures are reported as [`OperationError::InvalidOperationParameters`].
    pub fn from_request_json(request: &str) -> Result<Self, OperationError> {
        let operation: Operation = serde_json::from_str(request)
            .map_err(|e| OperationError::invalid_parameters(e.to_string()))?;
        operation.validate()?;
        Ok(operation)
    }

    /// Same as [`Operation::from_request_json`] for an already parsed JSON value
    pub fn from_request_value(request: serde_json::Value) -> Result<Self, OperationError> {
        let operation: Operation = serde_json::from_value(request)
            .map_err(|e| OperationError::invalid_parameters(e.to_string()))?;
        operation.validate()?;
        Ok(operation)
    }

    /// Name of the request kind (e.g., `"MergeActivities"`)
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::FilterEventFrequency { .. } => "FilterEventFrequency",
            Operation::FilterCaseLength { .. } => "FilterCaseLength",
            Operation::FilterCaseDuration { .. } => "FilterCaseDuration",
            Operation::FilterByStartEnd { .. } => "FilterByStartEnd",
            Operation::FilterByTimeRange { .. } => "FilterByTimeRange",
            Operation::FilterByExpression { .. } => "FilterByExpression",
            Operation::FilterByColumnCondition { .. } => "FilterByColumnCondition",
            Operation::MergeActivities { .. } => "MergeActivities",
            Operation::AggregateActivity { .. } => "AggregateActivity",
            Operation::RemoveSelfLoops { .. } => "RemoveSelfLoops",
            Operation::DeduplicateFirst => "DeduplicateFirst",
            Operation::Reset => "Reset",
            Operation::Custom { .. } => "Custom",
        }
    }

    ///
    /// Structural checks of the parameters, independent of any log
    ///
    /// Checks against the log (e.g., missing columns) happen when the operation is applied.
    pub fn validate(&self) -> Result<(), OperationError> {
        match self {
            Operation::FilterEventFrequency { min_freq } => {
                if *min_freq == 0 {
                    return Err(OperationError::invalid_parameters(
                        "minimal frequency must be at least 1",
                    ));
                }
            }
            Operation::FilterCaseLength { .. } => {}
            Operation::FilterCaseDuration { min_sec, max_sec } => {
                check_bound(*min_sec, "minimal duration")?;
                check_bound(*max_sec, "maximal duration")?;
                match (min_sec, max_sec) {
                    (None, None) => {
                        return Err(OperationError::invalid_parameters(
                            "duration filter without any bound",
                        ))
                    }
                    (Some(min), Some(max)) if min > max => {
                        return Err(OperationError::invalid_parameters(format!(
                            "minimal duration {} exceeds maximal duration {}",
                            min, max
                        )))
                    }
                    _ => {}
                }
            }
            Operation::FilterByStartEnd { start, end, mode } => {
                let start = non_blank(start.as_deref());
                let end = non_blank(end.as_deref());
                let (missing, unchecked) = match mode {
                    StartEndMode::StartOnly => (start.is_none(), end.is_some()),
                    StartEndMode::EndOnly => (end.is_none(), start.is_some()),
                    StartEndMode::Both => (start.is_none() || end.is_none(), false),
                };
                if missing {
                    return Err(OperationError::invalid_parameters(format!(
                        "start/end filter in mode {:?} is missing an activity",
                        mode
                    )));
                }
                if unchecked {
                    return Err(OperationError::invalid_parameters(format!(
                        "start/end filter in mode {:?} got an activity it does not check",
                        mode
                    )));
                }
            }
            Operation::FilterByTimeRange { start, end } => {
                if start > end {
                    return Err(OperationError::invalid_parameters(format!(
                        "time range starts after it ends ({} > {})",
                        start.to_rfc3339(),
                        end.to_rfc3339()
                    )));
                }
            }
            Operation::FilterByExpression { expr } => {
                require_name(expr, "expression")?;
                Expression::parse(expr)?;
            }
            Operation::FilterByColumnCondition { column, .. } => require_name(column, "column")?,
            Operation::MergeActivities {
                sources,
                target,
                fields,
                ..
            } => {
                if sources.is_empty() {
                    return Err(OperationError::invalid_parameters(
                        "merge without source activities",
                    ));
                }
                sources
                    .iter()
                    .try_for_each(|s| require_name(s, "source activity"))?;
                require_name(target, "target activity")?;
                fields.iter().try_for_each(|f| ensure_attribute_column(f))?;
            }
            Operation::AggregateActivity {
                target,
                agg_fields,
                new_col,
                ..
            } => {
                require_name(target, "target activity")?;
                match non_blank(new_col.as_deref()) {
                    Some(column) => ensure_attribute_column(column)?,
                    None => agg_fields
                        .iter()
                        .try_for_each(|f| ensure_attribute_column(f))?,
                }
            }
            Operation::Custom { description } => require_name(description, "description")?,
            Operation::RemoveSelfLoops { .. } | Operation::DeduplicateFirst | Operation::Reset => {}
        }
        Ok(())
    }

    /// Deterministic human-readable history line
    pub fn describe(&self) -> String {
        match self {
            Operation::FilterEventFrequency { min_freq } => format!(
                "Remove events of activities occurring fewer than {} times",
                min_freq
            ),
            Operation::FilterCaseLength { min_events } => {
                format!("Keep cases with at least {} events", min_events)
            }
            Operation::FilterCaseDuration { min_sec, max_sec } => match (min_sec, max_sec) {
                (Some(min), Some(max)) => {
                    format!("Keep cases lasting between {}s and {}s", min, max)
                }
                (Some(min), None) => format!("Keep cases lasting at least {}s", min),
                (None, Some(max)) => format!("Keep cases lasting at most {}s", max),
                (None, None) => "Keep cases of any duration".to_string(),
            },
            Operation::FilterByStartEnd { start, end, mode } => {
                let start = start.as_deref().unwrap_or_default();
                let end = end.as_deref().unwrap_or_default();
                match mode {
                    StartEndMode::StartOnly => format!("Keep cases starting with '{}'", start),
                    StartEndMode::EndOnly => format!("Keep cases ending with '{}'", end),
                    StartEndMode::Both => format!(
                        "Keep cases starting with '{}' and ending with '{}'",
                        start, end
                    ),
                }
            }
            Operation::FilterByTimeRange { start, end } => format!(
                "Keep events between {} and {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            ),
            Operation::FilterByExpression { expr } => format!("Keep rows matching [{}]", expr),
            Operation::FilterByColumnCondition {
                level,
                column,
                op,
                value,
            } => format!("Delete {} where {} {} {}", level, column, op, value),
            Operation::MergeActivities {
                sources,
                target,
                strategy,
                fields,
            } => {
                let mut line = format!(
                    "Merge {} → {} (keep {}",
                    sources.join(" + "),
                    target,
                    strategy
                );
                if !fields.is_empty() {
                    line.push_str(&format!("; join {}", fields.join(", ")));
                }
                line.push(')');
                line
            }
            Operation::AggregateActivity {
                target,
                strategy,
                agg_fields,
                new_col,
            } => {
                let fields = if agg_fields.is_empty() {
                    "no fields".to_string()
                } else {
                    agg_fields.iter().join(" + ")
                };
                match non_blank(new_col.as_deref()) {
                    Some(column) => format!(
                        "Aggregate {} (keep {}): {} → {}",
                        target, strategy, fields, column
                    ),
                    None => format!("Aggregate {} (keep {}): {}", target, strategy, fields),
                }
            }
            Operation::RemoveSelfLoops { strategy } => {
                format!("Remove self-loops (keep {})", strategy)
            }
            Operation::DeduplicateFirst => "Keep first occurrence of each activity".to_string(),
            Operation::Reset => "Reset to original log".to_string(),
            Operation::Custom { description } => format!("Custom: {}", description),
        }
    }

    ///
    /// Apply this operation to `current`
    ///
    /// `original` is the log a [`Operation::Reset`] restarts from. The result may be empty;
    /// rejecting empty results is up to the caller (see [`super::replay`]).
    pub fn apply(&self, current: &EventLog, original: &EventLog) -> Result<EventLog, OperationError> {
        match self {
            Operation::FilterEventFrequency { min_freq } => {
                Ok(filter_event_frequency(current, *min_freq))
            }
            Operation::FilterCaseLength { min_events } => {
                Ok(filter_case_length(current, *min_events))
            }
            Operation::FilterCaseDuration { min_sec, max_sec } => {
                Ok(filter_case_duration(current, *min_sec, *max_sec))
            }
            Operation::FilterByStartEnd { start, end, mode } => filter_by_start_end(
                current,
                non_blank(start.as_deref()),
                non_blank(end.as_deref()),
                *mode,
            ),
            Operation::FilterByTimeRange { start, end } => {
                filter_by_time_range(current, *start, *end)
            }
            Operation::FilterByExpression { expr } => filter_by_expression(current, expr),
            Operation::FilterByColumnCondition {
                level,
                column,
                op,
                value,
            } => delete_by_condition(current, *level, column, *op, value),
            Operation::MergeActivities {
                sources,
                target,
                strategy,
                fields,
            } => merge_activities(current, sources, target, *strategy, fields),
            Operation::AggregateActivity {
                target,
                strategy,
                agg_fields,
                new_col,
            } => aggregate_activity(
                current,
                target,
                *strategy,
                agg_fields,
                non_blank(new_col.as_deref()),
            ),
            Operation::RemoveSelfLoops { strategy } => Ok(remove_self_loops(current, *strategy)),
            Operation::DeduplicateFirst => Ok(deduplicate_first(current)),
            Operation::Reset => Ok(original.clone()),
            Operation::Custom { .. } => Ok(current.clone()),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{order_log, sample_log, ts};

    #[test]
    fn test_request_round_trip() {
        let op = Operation::MergeActivities {
            sources: vec!["Check".into(), "Approve".into()],
            target: "Review".into(),
            strategy: KeepStrategy::Last,
            fields: vec!["org:resource".into()],
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["kind"], "MergeActivities");
        assert_eq!(json["parameters"]["strategy"], "last");
        assert_eq!(Operation::from_request_value(json).unwrap(), op);

        let reset = Operation::from_request_json(r#"{"kind": "Reset"}"#).unwrap();
        assert_eq!(reset, Operation::Reset);
    }

    #[test]
    fn test_request_defaults() {
        let op = Operation::from_request_json(
            r#"{"kind": "AggregateActivity", "parameters": {"target": "Check"}}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::AggregateActivity {
                target: "Check".into(),
                strategy: KeepStrategy::First,
                agg_fields: vec![],
                new_col: None
            }
        );
        let op = Operation::from_request_json(
            r#"{"kind": "FilterByColumnCondition", "parameters": {"level": "case", "column": "cost",
                "op": ">=", "value": {"type": "Int", "content": 20}}}"#,
        )
        .unwrap();
        assert_eq!(op.describe(), "Delete cases where cost >= 20");
    }

    #[test]
    fn test_plain_literal_requests() {
        let condition = |value: &str| {
            Operation::from_request_json(&format!(
                r#"{{"kind": "FilterByColumnCondition", "parameters": {{"level": "event",
                    "column": "cost", "op": ">", "value": {}}}}}"#,
                value
            ))
            .map(|op| match op {
                Operation::FilterByColumnCondition { value, .. } => value,
                other => panic!("unexpected operation {:?}", other),
            })
        };
        assert_eq!(condition("50"), Ok(AttributeValue::Int(50)));
        assert_eq!(condition("2.5"), Ok(AttributeValue::Float(2.5)));
        assert_eq!(condition(r#""Cid""#), Ok(AttributeValue::from("Cid")));
        assert_eq!(condition("true"), Ok(AttributeValue::Boolean(true)));
        assert_eq!(condition("null"), Ok(AttributeValue::Null));
        assert_eq!(
            condition(r#"{"type": "Int", "content": 7}"#),
            Ok(AttributeValue::Int(7))
        );
        assert!(matches!(
            condition("[1, 2]"),
            Err(OperationError::InvalidOperationParameters(_))
        ));

        let op = Operation::from_request_json(
            r#"{"kind": "FilterByColumnCondition", "parameters": {"level": "event",
                "column": "org:resource", "op": "==", "value": "Cid"}}"#,
        )
        .unwrap();
        let log = op.apply(&order_log(), &order_log()).unwrap();
        assert_eq!(log.event_count(), order_log().event_count() - 2);

        // blank fields of a form count as absent
        assert!(Operation::from_request_json(
            r#"{"kind": "FilterByStartEnd", "parameters": {"start": "Create", "end": "", "mode": "start_only"}}"#,
        )
        .is_ok());
    }

    #[test]
    fn test_malformed_requests() {
        for request in [
            "not json",
            r#"{"kind": "Unknown"}"#,
            r#"{"kind": "FilterCaseLength", "parameters": {"min_events": -1}}"#,
            r#"{"kind": "FilterEventFrequency", "parameters": {"min_freq": 0}}"#,
            r#"{"kind": "MergeActivities", "parameters": {"sources": [], "target": "X"}}"#,
            r#"{"kind": "FilterByStartEnd", "parameters": {"start": " ", "mode": "start_only"}}"#,
            r#"{"kind": "FilterByStartEnd", "parameters": {"start": "A", "end": "B", "mode": "start_only"}}"#,
            r#"{"kind": "FilterCaseDuration", "parameters": {"min_sec": 10, "max_sec": 5}}"#,
            r#"{"kind": "FilterCaseDuration", "parameters": {}}"#,
            r#"{"kind": "Custom", "parameters": {"description": ""}}"#,
        ] {
            assert!(
                matches!(
                    Operation::from_request_json(request),
                    Err(OperationError::InvalidOperationParameters(_))
                ),
                "{}",
                request
            );
        }
        assert!(matches!(
            Operation::from_request_json(
                r#"{"kind": "FilterByExpression", "parameters": {"expr": "cost >"}}"#
            ),
            Err(OperationError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Operation::MergeActivities {
                sources: vec!["A".into(), "B".into()],
                target: "AB".into(),
                strategy: KeepStrategy::First,
                fields: vec![],
            }
            .to_string(),
            "Merge A + B → AB (keep first)"
        );
        assert_eq!(
            Operation::AggregateActivity {
                target: "Check".into(),
                strategy: KeepStrategy::Last,
                agg_fields: vec!["org:resource".into(), "cost".into()],
                new_col: Some("joined".into()),
            }
            .describe(),
            "Aggregate Check (keep last): org:resource + cost → joined"
        );
        assert_eq!(
            Operation::FilterCaseDuration {
                min_sec: None,
                max_sec: Some(60.0)
            }
            .describe(),
            "Keep cases lasting at most 60s"
        );
        assert_eq!(
            Operation::RemoveSelfLoops {
                strategy: KeepStrategy::First
            }
            .describe(),
            "Remove self-loops (keep first)"
        );
    }

    #[test]
    fn test_apply() {
        let original = order_log();
        let current = filter_case_length(&original, 4);
        assert_eq!(Operation::Reset.apply(&current, &original).unwrap(), original);
        assert_eq!(
            Operation::Custom {
                description: "manual fix".into()
            }
            .apply(&current, &original)
            .unwrap(),
            current
        );
        let collapsed = Operation::RemoveSelfLoops {
            strategy: KeepStrategy::First,
        }
        .apply(&sample_log(), &sample_log())
        .unwrap();
        assert_eq!(collapsed.event_count(), 4);
        let ranged = Operation::FilterByTimeRange {
            start: ts(10),
            end: ts(30),
        }
        .apply(&original, &original)
        .unwrap();
        assert_eq!(ranged.event_count(), 5);
        // blank new column writes back into the fields
        let aggregated = Operation::AggregateActivity {
            target: "Check".into(),
            strategy: KeepStrategy::First,
            agg_fields: vec!["cost".into()],
            new_col: Some("  ".into()),
        }
        .apply(&original, &original)
        .unwrap();
        assert_eq!(
            aggregated.cases[0].events[1]
                .get_field("o1", "cost")
                .unwrap(),
            AttributeValue::from("20|30")
        );
    }
}
