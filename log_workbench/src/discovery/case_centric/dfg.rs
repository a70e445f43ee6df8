//! Discover [`DirectlyFollowsGraph`]s from Data

use crate::core::{
    process_models::case_centric::dfg::{
        compute_layout, prune_dfg, DirectlyFollowsGraph, LayoutGraph, LayoutOptions,
    },
    EventLog,
};

/// Discover a [`DirectlyFollowsGraph`] from an [`EventLog`]
///
/// Every event counts towards its activity, every pair of chronologically adjacent events of a case
/// towards their directly-follows relation (including direct repetitions, i.e., self-loops).
/// Counts are plain sums, so the result does not depend on the order of cases.
pub fn discover_dfg(event_log: &EventLog) -> DirectlyFollowsGraph {
    let mut result = DirectlyFollowsGraph::new();
    event_log.cases.iter().for_each(|c| {
        c.events
            .iter()
            .for_each(|e| result.add_activity(e.activity.clone(), 1));
        c.events.windows(2).for_each(|w| {
            result.add_df_relation(w[0].activity.clone(), w[1].activity.clone(), 1)
        });
        if let Some(first) = c.start_activity() {
            result.add_start_activity(first.to_string(), 1);
        }
        if let Some(last) = c.end_activity() {
            result.add_end_activity(last.to_string(), 1);
        }
    });
    result
}

///
/// Discover, prune and lay out the directly-follows graph of an [`EventLog`]
///
/// The layout is seeded from the most frequent start activity of the (unpruned) graph.
pub fn build_layout(
    event_log: &EventLog,
    act_percent: f64,
    edge_percent: f64,
    options: &LayoutOptions,
) -> LayoutGraph {
    let dfg = discover_dfg(event_log);
    let pruned = prune_dfg(&dfg, act_percent, edge_percent);
    let layout = compute_layout(&pruned, dfg.most_frequent_start_activity(), options);
    tracing::info!(
        method = ?layout.method,
        act_percent,
        edge_percent,
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "laid out directly-follows graph"
    );
    layout
}
