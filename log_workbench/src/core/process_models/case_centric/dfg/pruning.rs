//! Pruning a [`DirectlyFollowsGraph`] to a requested density

use std::collections::HashSet;

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::dfg_struct::{Activity, DirectlyFollowsGraph};

/// Activity kept by [`prune_dfg`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrunedNode {
    /// Activity name
    pub activity: Activity,
    /// Number of occurrences in the log
    pub count: u64,
}

/// Directly-follows relation kept by [`prune_dfg`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrunedEdge {
    /// Source activity
    pub from: Activity,
    /// Target activity
    pub to: Activity,
    /// Number of times `from` is directly followed by `to`
    pub count: u64,
}

impl PrunedEdge {
    /// Whether this edge represents a direct repetition of one activity
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// The most frequent part of a [`DirectlyFollowsGraph`]
///
/// Nodes are ordered by count (descending, ties by name) and so are edges (ties by `(from, to)`).
/// Every edge connects two nodes of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PrunedGraph {
    /// Kept activities
    pub nodes: Vec<PrunedNode>,
    /// Kept directly-follows relations
    pub edges: Vec<PrunedEdge>,
}

impl PrunedGraph {
    /// Checks if an activity survived pruning
    pub fn contains_node<S: AsRef<str>>(&self, activity: S) -> bool {
        self.nodes.iter().any(|n| n.activity == activity.as_ref())
    }

    /// Largest activity count (`0` for an empty graph)
    pub fn max_node_count(&self) -> u64 {
        self.nodes.iter().map(|n| n.count).max().unwrap_or_default()
    }

    /// Largest edge count (`0` if there are no edges)
    pub fn max_edge_count(&self) -> u64 {
        self.edges.iter().map(|e| e.count).max().unwrap_or_default()
    }
}

/// Number of items to keep out of `total` for a percentage: `ceil(total * percent / 100)`, at least one (if any)
fn keep_count(total: usize, percent: f64) -> usize {
    if total == 0 {
        return 0;
    }
    let percent = if percent.is_nan() {
        100.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    let keep = ((total as f64 * percent) / 100.0).ceil() as usize;
    keep.clamp(1, total)
}

///
/// Keep the top `act_percent`% activities and the top `edge_percent`% directly-follows relations by frequency
///
/// Percentages are clamped to `0..=100`; at least one activity and one relation (if any exist) are selected.
/// A selected relation is only kept if both of its endpoints survived the activity pruning.
///
/// ```rust
/// use log_workbench::core::process_models::case_centric::dfg::{prune_dfg, DirectlyFollowsGraph};
///
/// let mut dfg = DirectlyFollowsGraph::new();
/// dfg.add_activity("a".into(), 10);
/// dfg.add_activity("b".into(), 2);
/// dfg.add_df_relation("a".into(), "b".into(), 2);
/// dfg.add_df_relation("a".into(), "a".into(), 5);
///
/// let pruned = prune_dfg(&dfg, 50.0, 100.0);
/// assert_eq!(pruned.nodes.len(), 1);
/// // a -> b was selected but its target was pruned
/// assert_eq!(pruned.edges.len(), 1);
/// ```
pub fn prune_dfg(dfg: &DirectlyFollowsGraph, act_percent: f64, edge_percent: f64) -> PrunedGraph {
    let nodes: Vec<PrunedNode> = dfg
        .activities
        .iter()
        .sorted_by(|(a_act, a_count), (b_act, b_count)| {
            b_count.cmp(a_count).then_with(|| a_act.cmp(b_act))
        })
        .take(keep_count(dfg.activities.len(), act_percent))
        .map(|(activity, count)| PrunedNode {
            activity: activity.clone(),
            count: *count,
        })
        .collect();

    let kept_activities: HashSet<&str> = nodes.iter().map(|n| n.activity.as_str()).collect();

    let edges: Vec<PrunedEdge> = dfg
        .directly_follows_relations
        .iter()
        .sorted_by(|(a_rel, a_count), (b_rel, b_count)| {
            b_count.cmp(a_count).then_with(|| a_rel.cmp(b_rel))
        })
        .take(keep_count(dfg.directly_follows_relations.len(), edge_percent))
        .filter(|((from, to), _)| {
            kept_activities.contains(from.as_str()) && kept_activities.contains(to.as_str())
        })
        .map(|((from, to), count)| PrunedEdge {
            from: from.clone(),
            to: to.clone(),
            count: *count,
        })
        .collect();

    PrunedGraph { nodes, edges }
}
