//! Summary counters, variants and duration statistics of an [`EventLog`]

use std::collections::HashMap;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::EventLog;

/// Headline numbers of an event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogSummary {
    /// Number of events
    pub events: usize,
    /// Number of cases
    pub cases: usize,
    /// Number of distinct activities
    pub activities: usize,
    /// Number of distinct variants (activity sequences)
    pub variants: usize,
}

/// Compute the [`LogSummary`] of a log
pub fn summarize_log(log: &EventLog) -> LogSummary {
    LogSummary {
        events: log.event_count(),
        cases: log.cases.len(),
        activities: log.activities().len(),
        variants: log
            .cases
            .iter()
            .map(|c| c.activity_sequence())
            .unique()
            .count(),
    }
}

/// Distinct activity sequence and the cases following it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Variant {
    /// Activity sequence
    pub activities: Vec<String>,
    /// Ids of the cases with exactly this sequence (in log order)
    pub case_ids: Vec<String>,
}

impl Variant {
    /// Number of cases following this variant
    pub fn frequency(&self) -> usize {
        self.case_ids.len()
    }
}

///
/// Group cases by their activity sequence
///
/// Variants are sorted by number of cases (descending), ties by activity sequence.
pub fn extract_variants(log: &EventLog) -> Vec<Variant> {
    let mut groups: HashMap<Vec<&str>, Vec<&str>> = HashMap::new();
    for case in &log.cases {
        groups
            .entry(case.activity_sequence())
            .or_default()
            .push(case.id.as_str());
    }
    groups
        .into_iter()
        .sorted_by(|(a_seq, a_cases), (b_seq, b_cases)| {
            b_cases.len().cmp(&a_cases.len()).then_with(|| a_seq.cmp(b_seq))
        })
        .map(|(activities, case_ids)| Variant {
            activities: activities.into_iter().map(String::from).collect(),
            case_ids: case_ids.into_iter().map(String::from).collect(),
        })
        .collect()
}

/// The `k` most frequent activities with their number of occurrences (ties by name)
pub fn top_k_activities(log: &EventLog, k: usize) -> Vec<(String, u64)> {
    log.cases
        .iter()
        .flat_map(|c| c.events.iter().map(|e| e.activity.as_str()))
        .counts()
        .into_iter()
        .sorted_by(|(a_act, a_count), (b_act, b_count)| {
            b_count.cmp(a_count).then_with(|| a_act.cmp(b_act))
        })
        .take(k)
        .map(|(activity, count)| (activity.to_string(), count as u64))
        .collect()
}

/// Duration of every case in seconds (in log order)
pub fn case_durations(log: &EventLog) -> Vec<(String, f64)> {
    log.cases
        .iter()
        .filter_map(|c| c.duration_seconds().map(|d| (c.id.clone(), d)))
        .collect()
}

/// Statistics over the case durations of a log (in seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DurationStatistics {
    /// Shortest case duration
    pub min: f64,
    /// Longest case duration
    pub max: f64,
    /// Mean case duration
    pub mean: f64,
    /// Median case duration
    pub median: f64,
    /// Id of the (first) longest case
    pub longest_case: String,
}

/// Compute [`DurationStatistics`]; `None` for a log without cases
pub fn duration_statistics(log: &EventLog) -> Option<DurationStatistics> {
    let durations = case_durations(log);
    let (longest_case, max) = durations.iter().fold(None, |best: Option<(&str, f64)>, (id, d)| {
        match best {
            Some((_, best_duration)) if best_duration >= *d => best,
            _ => Some((id.as_str(), *d)),
        }
    })?;
    let sorted: Vec<f64> = durations
        .iter()
        .map(|(_, d)| OrderedFloat(*d))
        .sorted()
        .map(|d| d.0)
        .collect();
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    Some(DurationStatistics {
        min: sorted[0],
        max,
        mean: sorted.iter().sum::<f64>() / n as f64,
        median,
        longest_case: longest_case.to_string(),
    })
}
