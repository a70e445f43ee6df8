//! Transform Library
//!
//! Pure functions mapping an [`EventLog`] and explicit parameters to a new [`EventLog`].
//! No transform reads anything besides its arguments; cases left without events are removed
//! and the events of every case stay sorted by timestamp.
use std::collections::BTreeSet;
use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::event_data::case_centric::{
    constants::{JOINED_VALUES_SEPARATOR, RESERVED_COLUMNS},
    AttributeValue, Case, Event, EventLog,
};
use crate::error::OperationError;

pub mod expression;
pub mod filters;
pub mod merge;
pub mod self_loops;

#[doc(inline)]
pub use expression::{ComparisonOperator, Expression};
#[doc(inline)]
pub use filters::{
    delete_by_condition, filter_by_expression, filter_by_start_end, filter_by_time_range,
    filter_case_duration, filter_case_length, filter_event_frequency,
};
#[doc(inline)]
pub use merge::{aggregate_activity, deduplicate_first, merge_activities};
#[doc(inline)]
pub use self_loops::remove_self_loops;

/// Which event of a group is kept as representative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeepStrategy {
    /// Earliest event
    #[default]
    First,
    /// Latest event
    Last,
}

impl Display for KeepStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeepStrategy::First => write!(f, "first"),
            KeepStrategy::Last => write!(f, "last"),
        }
    }
}

/// Granularity of a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLevel {
    /// Drop matching events only
    Event,
    /// Drop whole cases containing at least one matching event
    Case,
}

impl Display for ConditionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionLevel::Event => write!(f, "events"),
            ConditionLevel::Case => write!(f, "cases"),
        }
    }
}

/// Which boundary activities a start/end filter checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StartEndMode {
    /// Cases must start with the start activity
    StartOnly,
    /// Cases must end with the end activity
    EndOnly,
    /// Cases must start with the start activity and end with the end activity
    Both,
}

/// Keep the events for which `keep` returns `true`; cases without remaining events are removed
pub(crate) fn retain_events<F: FnMut(&Case, &Event) -> bool>(
    log: &EventLog,
    mut keep: F,
) -> EventLog {
    EventLog::from_cases(
        log.cases
            .iter()
            .filter_map(|case| {
                let events: Vec<Event> = case
                    .events
                    .iter()
                    .filter(|e| keep(case, e))
                    .cloned()
                    .collect();
                (!events.is_empty()).then(|| Case {
                    id: case.id.clone(),
                    events,
                })
            })
            .collect(),
    )
}

/// Keep the cases for which `keep` returns `true`
pub(crate) fn retain_cases<F: FnMut(&Case) -> bool>(log: &EventLog, mut keep: F) -> EventLog {
    EventLog::from_cases(log.cases.iter().filter(|c| keep(c)).cloned().collect())
}

/// Reserved columns (case id, activity, timestamp) cannot be overwritten with joined values
pub(crate) fn ensure_attribute_column(name: &str) -> Result<(), OperationError> {
    if RESERVED_COLUMNS.contains(&name) {
        return Err(OperationError::invalid_parameters(format!(
            "column '{}' cannot be overwritten",
            name
        )));
    }
    Ok(())
}

/// Sorted unique non-null values of `fields` over `events`, joined with [`JOINED_VALUES_SEPARATOR`]
///
/// Returns [`AttributeValue::Null`] if none of the events has a value for the field.
pub(crate) fn joined_unique_values<'a, I>(case_id: &str, events: I, fields: &[&str]) -> AttributeValue
where
    I: IntoIterator<Item = &'a Event>,
{
    let values: BTreeSet<String> = events
        .into_iter()
        .flat_map(|e| fields.iter().filter_map(|f| e.get_field(case_id, f)))
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .collect();
    if values.is_empty() {
        AttributeValue::Null
    } else {
        AttributeValue::String(
            values
                .into_iter()
                .collect::<Vec<_>>()
                .join(JOINED_VALUES_SEPARATOR),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{order_log, sample_log};

    #[test]
    fn test_retain_events_drops_empty_cases() {
        let log = retain_events(&sample_log(), |case, e| case.id == "C2" || e.activity == "C");
        assert_eq!(log.cases.len(), 1);
        assert_eq!(log.cases[0].id, "C2");
    }

    #[test]
    fn test_joined_unique_values() {
        let log = order_log();
        let o1 = &log.cases[0];
        assert_eq!(
            joined_unique_values(&o1.id, &o1.events, &["org:resource"]),
            AttributeValue::String("Ann|Bob|Cid|Dan".to_string())
        );
        assert_eq!(
            joined_unique_values(&o1.id, &o1.events[1..3], &["org:resource", "cost"]),
            AttributeValue::String("20|30|Bob|Cid".to_string())
        );
        assert_eq!(
            joined_unique_values(&o1.id, &o1.events, &["missing"]),
            AttributeValue::Null
        );
    }

    #[test]
    fn test_strategy_serialization() {
        assert_eq!(serde_json::to_string(&KeepStrategy::Last).unwrap(), "\"last\"");
        assert_eq!(
            serde_json::from_str::<StartEndMode>("\"start_only\"").unwrap(),
            StartEndMode::StartOnly
        );
        assert_eq!(
            serde_json::from_str::<ConditionLevel>("\"case\"").unwrap(),
            ConditionLevel::Case
        );
    }
}
