//! Event- and case-level filters
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::core::event_data::case_centric::{AttributeValue, Event, EventLog, EventTable};
use crate::error::OperationError;

use super::expression::{ComparisonOperator, Expression};
use super::{retain_cases, retain_events, ConditionLevel, StartEndMode};

/// Number of occurrences of every activity in the log
fn activity_counts(log: &EventLog) -> HashMap<&str, u64> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    log.cases
        .iter()
        .flat_map(|c| c.events.iter())
        .for_each(|e| *counts.entry(e.activity.as_str()).or_default() += 1);
    counts
}

///
/// Drop all events whose activity occurs fewer than `min_freq` times in the whole log
///
/// Cases survive (possibly shortened) unless all of their events are dropped.
pub fn filter_event_frequency(log: &EventLog, min_freq: u64) -> EventLog {
    let counts = activity_counts(log);
    retain_events(log, |_, e| {
        counts.get(e.activity.as_str()).copied().unwrap_or_default() >= min_freq
    })
}

/// Keep only cases with at least `min_events` events
pub fn filter_case_length(log: &EventLog, min_events: usize) -> EventLog {
    retain_cases(log, |c| c.events.len() >= min_events)
}

///
/// Keep only cases whose duration (last minus first timestamp, in seconds) lies within the given bounds
///
/// Both bounds are inclusive; a missing bound is not checked.
pub fn filter_case_duration(log: &EventLog, min_sec: Option<f64>, max_sec: Option<f64>) -> EventLog {
    retain_cases(log, |c| match c.duration_seconds() {
        Some(duration) => {
            min_sec.map_or(true, |min| duration >= min) && max_sec.map_or(true, |max| duration <= max)
        }
        None => false,
    })
}

///
/// Keep only cases starting and/or ending with the given activities
///
/// The `mode` selects which conditions are checked and each checked condition needs its activity:
/// [`StartEndMode::StartOnly`] requires `start`, [`StartEndMode::EndOnly`] requires `end` and
/// [`StartEndMode::Both`] requires both. Supplying an activity the mode does not check is rejected.
/// A case is kept iff every checked condition holds.
pub fn filter_by_start_end(
    log: &EventLog,
    start: Option<&str>,
    end: Option<&str>,
    mode: StartEndMode,
) -> Result<EventLog, OperationError> {
    let (start, end) = match (mode, start, end) {
        (StartEndMode::StartOnly, Some(s), None) => (Some(s), None),
        (StartEndMode::EndOnly, None, Some(e)) => (None, Some(e)),
        (StartEndMode::Both, Some(s), Some(e)) => (Some(s), Some(e)),
        (StartEndMode::StartOnly, Some(_), Some(e)) => {
            return Err(OperationError::invalid_parameters(format!(
                "start-only filter cannot check end activity '{}'",
                e
            )))
        }
        (StartEndMode::EndOnly, Some(s), Some(_)) => {
            return Err(OperationError::invalid_parameters(format!(
                "end-only filter cannot check start activity '{}'",
                s
            )))
        }
        (StartEndMode::StartOnly, None, _) => {
            return Err(OperationError::invalid_parameters(
                "start/end filter without start activity",
            ))
        }
        (StartEndMode::EndOnly, _, None) => {
            return Err(OperationError::invalid_parameters(
                "start/end filter without end activity",
            ))
        }
        (StartEndMode::Both, _, _) => {
            return Err(OperationError::invalid_parameters(
                "start/end filter requires both a start and an end activity",
            ))
        }
    };
    Ok(retain_cases(log, |c| {
        start.map_or(true, |s| c.start_activity() == Some(s))
            && end.map_or(true, |e| c.end_activity() == Some(e))
    }))
}

/// Keep only events with `start <= timestamp <= end`
pub fn filter_by_time_range(
    log: &EventLog,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<EventLog, OperationError> {
    if start > end {
        return Err(OperationError::invalid_parameters(format!(
            "time range starts after it ends ({} > {})",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok(retain_events(log, |_, e| {
        e.timestamp >= start && e.timestamp <= end
    }))
}

///
/// Keep only the rows of the event table matching a boolean expression
///
/// See [`super::expression`] for the expression language. Referencing a column that does not exist
/// in the log yields [`OperationError::FieldNotFound`].
pub fn filter_by_expression(log: &EventLog, source: &str) -> Result<EventLog, OperationError> {
    let expression = Expression::parse(source)?;
    log.require_columns(&expression.referenced_fields().into_iter().collect::<Vec<_>>())?;
    let table = log.to_event_table();
    Ok(EventLog::from_event_table(EventTable {
        rows: table
            .rows
            .into_iter()
            .filter(|row| expression.matches(row))
            .collect(),
    }))
}

///
/// Delete events (or whole cases) where `column op value` holds
///
/// With [`ConditionLevel::Event`] only the matching events are dropped; with [`ConditionLevel::Case`]
/// every case containing at least one matching event is dropped.
pub fn delete_by_condition(
    log: &EventLog,
    level: ConditionLevel,
    column: &str,
    op: ComparisonOperator,
    value: &AttributeValue,
) -> Result<EventLog, OperationError> {
    log.require_columns(&[column])?;
    let hit = |case_id: &str, e: &Event| {
        op.apply(
            &e.get_field(case_id, column).unwrap_or(AttributeValue::Null),
            value,
        )
    };
    Ok(match level {
        ConditionLevel::Event => retain_events(log, |c, e| !hit(&c.id, e)),
        ConditionLevel::Case => retain_cases(log, |c| !c.events.iter().any(|e| hit(&c.id, e))),
    })
}
