//! Removal of consecutive self-loops (direct repetitions of an activity)
use crate::core::event_data::case_centric::{Case, Event, EventLog};

use super::KeepStrategy;

///
/// Collapse every maximal run of directly repeated activities to a single event
///
/// Keeps the first or the last event of each run. Repetitions separated by another activity are
/// not touched. Single left-to-right pass per case.
///
/// ```rust
/// use log_workbench::core::event_data::case_centric::{Case, Event, EventLog};
/// use log_workbench::core::chrono::{TimeZone, Utc};
/// use log_workbench::transform::{remove_self_loops, KeepStrategy};
///
/// let t = |s| Utc.timestamp_opt(s, 0).unwrap().fixed_offset();
/// let log = EventLog::from_cases(vec![Case::with_events(
///     "1",
///     vec![Event::new("A", t(0)), Event::new("A", t(1)), Event::new("B", t(2)), Event::new("A", t(3))],
/// )]);
/// let collapsed = remove_self_loops(&log, KeepStrategy::Last);
/// assert_eq!(collapsed.cases[0].activity_sequence(), vec!["A", "B", "A"]);
/// assert_eq!(collapsed.cases[0].events[0].timestamp, t(1));
/// ```
pub fn remove_self_loops(log: &EventLog, strategy: KeepStrategy) -> EventLog {
    EventLog::from_cases(
        log.cases
            .iter()
            .map(|case| {
                let mut events: Vec<Event> = Vec::with_capacity(case.events.len());
                for event in &case.events {
                    match events.last_mut() {
                        Some(previous) if previous.activity == event.activity => {
                            if strategy == KeepStrategy::Last {
                                *previous = event.clone();
                            }
                        }
                        _ => events.push(event.clone()),
                    }
                }
                Case {
                    id: case.id.clone(),
                    events,
                }
            })
            .collect(),
    )
}
