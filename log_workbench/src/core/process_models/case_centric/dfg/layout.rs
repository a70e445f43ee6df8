//! 2-D layout of a [`PrunedGraph`] for rendering
//!
//! Acyclic graphs (ignoring self-loops) get a strict layered layout: longest-path ranks from left
//! to right and a barycenter ordering within each rank. Directly-follows graphs are usually cyclic;
//! those are laid out with a deterministic force-directed placement seeded by breadth-first ranks
//! from the start activity. Both paths run a bounded number of steps on any directed graph.

use std::collections::{HashMap, HashSet, VecDeque};

use ordered_float::OrderedFloat;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction::{Incoming, Outgoing};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::dfg_struct::Activity;
use super::pruning::PrunedGraph;

/// Pull of each node towards the x coordinate of its rank during force-directed placement
const RANK_ANCHOR_STRENGTH: f64 = 0.3;
/// Distance below which two nodes are treated as coinciding
const MIN_DISTANCE: f64 = 1e-3;

/// Options for [`compute_layout`]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LayoutOptions {
    /// Horizontal distance between two ranks
    pub layer_spacing: f64,
    /// Vertical distance between two nodes of the same rank
    pub node_spacing: f64,
    /// Diameter of the least frequent node
    pub min_node_size: f64,
    /// Diameter of the most frequent node
    pub max_node_size: f64,
    /// Stroke width of the least frequent edge
    pub min_edge_width: f64,
    /// Stroke width of the most frequent edge
    pub max_edge_width: f64,
    /// Radius of self-loop arcs
    pub self_loop_radius: f64,
    /// Bend of the two edges of a mutual pair (`a -> b` and `b -> a`)
    pub curve_offset: f64,
    /// Number of force-directed iterations for cyclic graphs
    pub force_iterations: usize,
    /// Ideal edge length of the force-directed placement
    pub ideal_edge_length: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            layer_spacing: 200.0,
            node_spacing: 120.0,
            min_node_size: 40.0,
            max_node_size: 90.0,
            min_edge_width: 1.0,
            max_edge_width: 8.0,
            self_loop_radius: 20.0,
            curve_offset: 30.0,
            force_iterations: 300,
            ideal_edge_length: 150.0,
        }
    }
}

/// Which layout path produced a [`LayoutGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LayoutMethod {
    /// Strict layering (graph without self-loops is acyclic)
    Layered,
    /// Force-directed fallback for cyclic graphs
    ForceDirected,
}

/// Side of a node a self-loop arc is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LoopSide {
    /// Above the node
    Top,
    /// Below the node
    Bottom,
}

/// How an edge should be drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum EdgeRoute {
    /// Straight line from source to target
    Straight,
    /// Curve bent by `offset` to the right of the travel direction (used when the reverse edge exists too)
    Curved {
        /// Bend distance at the midpoint
        offset: f64,
    },
    /// Short arc leaving and re-entering the node on one side
    SelfLoop {
        /// Anchor side
        side: LoopSide,
        /// Arc radius
        radius: f64,
    },
}

/// Positioned activity node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoutNode {
    /// Activity name
    pub activity: Activity,
    /// Number of occurrences
    pub count: u64,
    /// Rank (column) the node was assigned to
    pub rank: usize,
    /// Center x coordinate
    pub x: f64,
    /// Center y coordinate
    pub y: f64,
    /// Occurrence count relative to the most frequent node (`0..=1`)
    pub weight: f64,
    /// Diameter derived from `weight`
    pub size: f64,
}

impl LayoutNode {
    /// Detail text for tooltips
    pub fn tooltip(&self) -> String {
        format!("{}\nfrequency: {}", self.activity, self.count)
    }
}

/// Routed directly-follows edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoutEdge {
    /// Source activity
    pub from: Activity,
    /// Target activity
    pub to: Activity,
    /// Number of occurrences
    pub count: u64,
    /// Routing class
    pub route: EdgeRoute,
    /// Frequency relative to the most frequent edge (`0..=1`)
    pub weight: f64,
    /// Stroke width derived from `weight`
    pub width: f64,
    /// Where to draw the frequency label
    pub label_position: (f64, f64),
}

impl LayoutEdge {
    /// Detail text for tooltips
    pub fn tooltip(&self) -> String {
        format!("{} → {}\nfrequency: {}", self.from, self.to, self.count)
    }
}

/// Positioned graph handed to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoutGraph {
    /// Layout path that was used
    pub method: LayoutMethod,
    /// Activity the layout was seeded from
    pub start_activity: Option<Activity>,
    /// Nodes, in the order of the pruned graph
    pub nodes: Vec<LayoutNode>,
    /// Edges, in the order of the pruned graph
    pub edges: Vec<LayoutEdge>,
    /// Width of the bounding box (all coordinates are within `0..=width`)
    pub width: f64,
    /// Height of the bounding box (all coordinates are within `0..=height`)
    pub height: f64,
}

impl LayoutGraph {
    /// Get a node by activity name
    pub fn node<S: AsRef<str>>(&self, activity: S) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.activity == activity.as_ref())
    }

    /// Get an edge by its endpoints
    pub fn edge<S: AsRef<str>>(&self, from: S, to: S) -> Option<&LayoutEdge> {
        self.edges
            .iter()
            .find(|e| e.from == from.as_ref() && e.to == to.as_ref())
    }
}

/// `count / max` (or `0` if `max` is zero)
fn relative(count: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        count as f64 / max as f64
    }
}

fn interpolate(min: f64, max: f64, weight: f64) -> f64 {
    min + (max - min) * weight
}

///
/// Compute positions and edge routes for a pruned directly-follows graph
///
/// `start_hint` should be the most frequent start activity (see
/// [`DirectlyFollowsGraph::most_frequent_start_activity`](super::DirectlyFollowsGraph::most_frequent_start_activity)).
/// If it did not survive pruning, the most frequent node without incoming edges (or the most frequent node) is used.
///
/// On acyclic graphs ranks are longest-path layers, so the start node is only placed first within its
/// own rank and is not necessarily in rank 0. Cyclic graphs are ranked by breadth-first distance from
/// the start node, which then always has rank 0.
pub fn compute_layout(
    pruned: &PrunedGraph,
    start_hint: Option<&str>,
    options: &LayoutOptions,
) -> LayoutGraph {
    let index_of: HashMap<&str, usize> = pruned
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.activity.as_str(), i))
        .collect();

    // Self-loops do not influence ranks
    let mut graph: DiGraph<(), u64> = DiGraph::with_capacity(pruned.nodes.len(), pruned.edges.len());
    pruned.nodes.iter().for_each(|_| {
        graph.add_node(());
    });
    for edge in pruned.edges.iter().filter(|e| !e.is_self_loop()) {
        if let (Some(&from), Some(&to)) = (
            index_of.get(edge.from.as_str()),
            index_of.get(edge.to.as_str()),
        ) {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), edge.count);
        }
    }

    let start = resolve_start(pruned, &graph, start_hint, &index_of);

    let (method, ranks, mut positions) = match toposort(&graph, None) {
        Ok(order) => {
            let ranks = longest_path_ranks(&graph, &order);
            let positions = layered_positions(&graph, &ranks, start, options);
            (LayoutMethod::Layered, ranks, positions)
        }
        Err(cycle) => {
            tracing::debug!(
                activity = %pruned.nodes[cycle.node_id().index()].activity,
                "directly-follows graph is cyclic, using force-directed layout"
            );
            let ranks = bfs_ranks(&graph, start);
            let initial = layered_positions(&graph, &ranks, start, options);
            let positions = force_directed_positions(&graph, &ranks, initial, options);
            (LayoutMethod::ForceDirected, ranks, positions)
        }
    };

    let (width, height) = normalize(&mut positions, options.max_node_size);

    let max_node_count = pruned.max_node_count();
    let nodes: Vec<LayoutNode> = pruned
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let weight = relative(n.count, max_node_count);
            LayoutNode {
                activity: n.activity.clone(),
                count: n.count,
                rank: ranks[i],
                x: positions[i].0,
                y: positions[i].1,
                weight,
                size: interpolate(options.min_node_size, options.max_node_size, weight),
            }
        })
        .collect();

    let pairs: HashSet<(&str, &str)> = pruned
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    let max_edge_count = pruned.max_edge_count();
    let edges: Vec<LayoutEdge> = pruned
        .edges
        .iter()
        .filter_map(|e| {
            let from = &nodes[*index_of.get(e.from.as_str())?];
            let to = &nodes[*index_of.get(e.to.as_str())?];
            let route = if e.is_self_loop() {
                EdgeRoute::SelfLoop {
                    side: self_loop_side(from, &nodes, &pruned.edges),
                    radius: options.self_loop_radius,
                }
            } else if pairs.contains(&(e.to.as_str(), e.from.as_str())) {
                EdgeRoute::Curved {
                    offset: options.curve_offset,
                }
            } else {
                EdgeRoute::Straight
            };
            let weight = relative(e.count, max_edge_count);
            Some(LayoutEdge {
                from: e.from.clone(),
                to: e.to.clone(),
                count: e.count,
                label_position: label_position(from, to, &route),
                route,
                weight,
                width: interpolate(options.min_edge_width, options.max_edge_width, weight),
            })
        })
        .collect();

    tracing::debug!(
        ?method,
        nodes = nodes.len(),
        edges = edges.len(),
        "computed directly-follows graph layout"
    );

    LayoutGraph {
        method,
        start_activity: start.map(|i| pruned.nodes[i].activity.clone()),
        nodes,
        edges,
        width,
        height,
    }
}

/// Index of the node to seed the layout from
fn resolve_start(
    pruned: &PrunedGraph,
    graph: &DiGraph<(), u64>,
    start_hint: Option<&str>,
    index_of: &HashMap<&str, usize>,
) -> Option<usize> {
    if let Some(&i) = start_hint.and_then(|h| index_of.get(h)) {
        return Some(i);
    }
    // Nodes are ordered by count, so the first match is the most frequent one
    (0..pruned.nodes.len())
        .find(|&i| {
            graph
                .neighbors_directed(NodeIndex::new(i), Incoming)
                .next()
                .is_none()
        })
        .or(if pruned.nodes.is_empty() { None } else { Some(0) })
}

/// Longest-path layering along a topological order
fn longest_path_ranks(graph: &DiGraph<(), u64>, order: &[NodeIndex]) -> Vec<usize> {
    let mut ranks = vec![0usize; graph.node_count()];
    for v in order {
        let next = ranks[v.index()] + 1;
        for w in graph.neighbors_directed(*v, Outgoing) {
            ranks[w.index()] = ranks[w.index()].max(next);
        }
    }
    ranks
}

/// Breadth-first ranks from the start node; unreachable parts start again at rank `0`
fn bfs_ranks(graph: &DiGraph<(), u64>, start: Option<usize>) -> Vec<usize> {
    let n = graph.node_count();
    let mut ranks: Vec<Option<usize>> = vec![None; n];
    let roots = start.into_iter().chain(0..n);
    let mut queue: VecDeque<usize> = VecDeque::new();
    for root in roots {
        if ranks[root].is_some() {
            continue;
        }
        ranks[root] = Some(0);
        queue.push_back(root);
        while let Some(v) = queue.pop_front() {
            let next = ranks[v].unwrap_or_default() + 1;
            for w in graph.neighbors_directed(NodeIndex::new(v), Outgoing) {
                if ranks[w.index()].is_none() {
                    ranks[w.index()] = Some(next);
                    queue.push_back(w.index());
                }
            }
        }
    }
    ranks.into_iter().map(Option::unwrap_or_default).collect()
}

/// Place nodes on their ranks (left to right); one barycenter sweep orders each rank
fn layered_positions(
    graph: &DiGraph<(), u64>,
    ranks: &[usize],
    start: Option<usize>,
    options: &LayoutOptions,
) -> Vec<(f64, f64)> {
    let n = ranks.len();
    let layer_count = ranks.iter().max().map_or(0, |m| m + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    // Start node first, then by frequency (the node order)
    let mut initial: Vec<usize> = (0..n).collect();
    initial.sort_by_key(|&i| (Some(i) != start, i));
    for i in initial {
        layers[ranks[i]].push(i);
    }

    let centered = |pos: usize, len: usize| pos as f64 - (len as f64 - 1.0) / 2.0;
    let mut slot = vec![0.0f64; n];
    for layer in &layers {
        for (pos, &v) in layer.iter().enumerate() {
            slot[v] = centered(pos, layer.len());
        }
    }
    for r in 1..layer_count {
        let mut keyed: Vec<(OrderedFloat<f64>, usize)> = layers[r]
            .iter()
            .map(|&v| {
                let preds: Vec<f64> = graph
                    .neighbors_directed(NodeIndex::new(v), Incoming)
                    .filter(|p| ranks[p.index()] < r)
                    .map(|p| slot[p.index()])
                    .collect();
                let key = if preds.is_empty() {
                    slot[v]
                } else {
                    preds.iter().sum::<f64>() / preds.len() as f64
                };
                (OrderedFloat(key), v)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        layers[r] = keyed.into_iter().map(|(_, v)| v).collect();
        let len = layers[r].len();
        for (pos, &v) in layers[r].iter().enumerate() {
            slot[v] = centered(pos, len);
        }
    }

    let mut positions = vec![(0.0, 0.0); n];
    for (r, layer) in layers.iter().enumerate() {
        for &v in layer {
            positions[v] = (r as f64 * options.layer_spacing, slot[v] * options.node_spacing);
        }
    }
    positions
}

/// Vector from `q` to `p` and its length; coinciding nodes are pushed apart in a fixed direction
fn separation(p: (f64, f64), q: (f64, f64), i: usize, j: usize) -> (f64, f64, f64) {
    let (dx, dy) = (p.0 - q.0, p.1 - q.1);
    let d = dx.hypot(dy);
    if d < MIN_DISTANCE {
        let angle = (i * 7 + j * 13) as f64;
        (angle.cos() * MIN_DISTANCE, angle.sin() * MIN_DISTANCE, MIN_DISTANCE)
    } else {
        (dx, dy, d)
    }
}

/// Fruchterman-Reingold placement with a linear cooling schedule and a pull towards each node's rank column
fn force_directed_positions(
    graph: &DiGraph<(), u64>,
    ranks: &[usize],
    initial: Vec<(f64, f64)>,
    options: &LayoutOptions,
) -> Vec<(f64, f64)> {
    let n = initial.len();
    if n < 2 {
        return initial;
    }
    let k = options.ideal_edge_length.max(1.0);
    let iterations = options.force_iterations;
    let anchors: Vec<f64> = ranks
        .iter()
        .map(|&r| r as f64 * options.layer_spacing)
        .collect();
    let edges: Vec<(usize, usize)> = graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e))
        .map(|(a, b)| (a.index(), b.index()))
        .collect();

    let mut pos = initial;
    for it in 0..iterations {
        let temperature = k * (1.0 - it as f64 / iterations as f64);
        let mut disp = vec![(0.0f64, 0.0f64); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy, d) = separation(pos[i], pos[j], i, j);
                let force = k * k / d;
                disp[i].0 += dx / d * force;
                disp[i].1 += dy / d * force;
                disp[j].0 -= dx / d * force;
                disp[j].1 -= dy / d * force;
            }
        }
        for &(a, b) in &edges {
            let (dx, dy, d) = separation(pos[a], pos[b], a, b);
            let force = d * d / k;
            disp[a].0 -= dx / d * force;
            disp[a].1 -= dy / d * force;
            disp[b].0 += dx / d * force;
            disp[b].1 += dy / d * force;
        }
        for i in 0..n {
            disp[i].0 += (anchors[i] - pos[i].0) * RANK_ANCHOR_STRENGTH;
            let len = disp[i].0.hypot(disp[i].1);
            if len > f64::EPSILON {
                let step = len.min(temperature);
                pos[i].0 += disp[i].0 / len * step;
                pos[i].1 += disp[i].1 / len * step;
            }
        }
    }
    pos
}

/// Shift all positions so that the bounding box starts at `(margin, margin)`; returns the box size including margins
fn normalize(positions: &mut [(f64, f64)], margin: f64) -> (f64, f64) {
    if positions.is_empty() {
        return (0.0, 0.0);
    }
    let min_x = positions.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let min_y = positions.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    positions.iter_mut().for_each(|p| {
        p.0 += margin - min_x;
        p.1 += margin - min_y;
    });
    let max_x = positions.iter().map(|p| p.0).fold(0.0, f64::max);
    let max_y = positions.iter().map(|p| p.1).fold(0.0, f64::max);
    (max_x + margin, max_y + margin)
}

/// Put the loop on the side with fewer neighbors
fn self_loop_side(
    node: &LayoutNode,
    nodes: &[LayoutNode],
    edges: &[super::pruning::PrunedEdge],
) -> LoopSide {
    let neighbor_dy: f64 = edges
        .iter()
        .filter(|e| !e.is_self_loop())
        .filter_map(|e| {
            if e.from == node.activity {
                Some(e.to.as_str())
            } else if e.to == node.activity {
                Some(e.from.as_str())
            } else {
                None
            }
        })
        .filter_map(|other| nodes.iter().find(|n| n.activity == other))
        .map(|other| other.y - node.y)
        .sum();
    if neighbor_dy < 0.0 {
        LoopSide::Bottom
    } else {
        LoopSide::Top
    }
}

fn label_position(from: &LayoutNode, to: &LayoutNode, route: &EdgeRoute) -> (f64, f64) {
    let mid = ((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
    match route {
        EdgeRoute::Straight => mid,
        EdgeRoute::Curved { offset } => {
            let (dx, dy) = (to.x - from.x, to.y - from.y);
            let len = dx.hypot(dy);
            if len < MIN_DISTANCE {
                mid
            } else {
                // right-hand normal in screen coordinates (y grows downwards)
                (mid.0 - dy / len * offset, mid.1 + dx / len * offset)
            }
        }
        EdgeRoute::SelfLoop { side, radius } => {
            let reach = from.size / 2.0 + 2.0 * radius;
            match side {
                LoopSide::Top => (from.x, from.y - reach),
                LoopSide::Bottom => (from.x, from.y + reach),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_models::case_centric::dfg::{prune_dfg, DirectlyFollowsGraph};

    fn graph(activities: &[(&str, u64)], relations: &[(&str, &str, u64)]) -> PrunedGraph {
        let mut dfg = DirectlyFollowsGraph::new();
        activities
            .iter()
            .for_each(|(a, c)| dfg.add_activity(a.to_string(), *c));
        relations
            .iter()
            .for_each(|(f, t, c)| dfg.add_df_relation(f.to_string(), t.to_string(), *c));
        prune_dfg(&dfg, 100.0, 100.0)
    }

    #[test]
    fn test_acyclic_graph_is_layered() {
        let pruned = graph(
            &[("a", 5), ("b", 3), ("c", 4), ("d", 1)],
            &[("a", "b", 3), ("b", "c", 2), ("a", "c", 2), ("c", "c", 1), ("a", "d", 1)],
        );
        let layout = compute_layout(&pruned, Some("a"), &LayoutOptions::default());
        assert_eq!(layout.method, LayoutMethod::Layered);
        assert_eq!(layout.start_activity.as_deref(), Some("a"));
        let rank = |a: &str| layout.node(a).unwrap().rank;
        assert_eq!((rank("a"), rank("b"), rank("c"), rank("d")), (0, 1, 2, 1));
        let x = |a: &str| layout.node(a).unwrap().x;
        assert!(x("a") < x("b") && x("b") < x("c"));
        assert_eq!(
            layout.edge("c", "c").unwrap().route,
            EdgeRoute::SelfLoop {
                side: LoopSide::Bottom,
                radius: LayoutOptions::default().self_loop_radius
            }
        );
        assert_eq!(layout.edge("a", "b").unwrap().route, EdgeRoute::Straight);
    }

    #[test]
    fn test_cyclic_graph_falls_back_to_force_directed() {
        let pruned = graph(
            &[("a", 5), ("b", 5), ("c", 2)],
            &[("a", "b", 4), ("b", "a", 3), ("b", "c", 2), ("c", "a", 1)],
        );
        let options = LayoutOptions::default();
        let layout = compute_layout(&pruned, Some("a"), &options);
        assert_eq!(layout.method, LayoutMethod::ForceDirected);
        assert!(layout
            .nodes
            .iter()
            .all(|n| n.x.is_finite() && n.y.is_finite()));
        assert!(layout
            .nodes
            .iter()
            .all(|n| n.x >= 0.0 && n.x <= layout.width && n.y >= 0.0 && n.y <= layout.height));
        // mutual pair is bent, the rest stays straight
        assert_eq!(
            layout.edge("a", "b").unwrap().route,
            EdgeRoute::Curved {
                offset: options.curve_offset
            }
        );
        assert_eq!(layout.edge("b", "c").unwrap().route, EdgeRoute::Straight);
        // nodes do not collapse onto each other
        for (i, p) in layout.nodes.iter().enumerate() {
            for q in layout.nodes.iter().skip(i + 1) {
                assert!((p.x - q.x).hypot(p.y - q.y) > 1.0);
            }
        }
        // deterministic
        assert_eq!(layout, compute_layout(&pruned, Some("a"), &options));
    }

    #[test]
    fn test_start_hint_fallback() {
        let pruned = graph(&[("x", 1), ("y", 9)], &[("x", "y", 1)]);
        let layout = compute_layout(&pruned, Some("missing"), &LayoutOptions::default());
        assert_eq!(layout.start_activity.as_deref(), Some("x"));
        let layout = compute_layout(&pruned, None, &LayoutOptions::default());
        assert_eq!(layout.start_activity.as_deref(), Some("x"));
    }

    #[test]
    fn test_visual_weights_are_monotonic() {
        let pruned = graph(
            &[("a", 10), ("b", 5), ("c", 1)],
            &[("a", "b", 8), ("b", "c", 2), ("a", "c", 4)],
        );
        let options = LayoutOptions::default();
        let layout = compute_layout(&pruned, None, &options);
        let ab = layout.edge("a", "b").unwrap();
        let ac = layout.edge("a", "c").unwrap();
        let bc = layout.edge("b", "c").unwrap();
        assert_eq!(ab.weight, 1.0);
        assert_eq!(ab.width, options.max_edge_width);
        assert!(ab.width > ac.width && ac.width > bc.width);
        let a = layout.node("a").unwrap();
        let c = layout.node("c").unwrap();
        assert_eq!(a.size, options.max_node_size);
        assert!(a.size > c.size);
        assert_eq!(ab.tooltip(), "a → b\nfrequency: 8");
        assert_eq!(a.tooltip(), "a\nfrequency: 10");
    }

    #[test]
    fn test_only_self_loops() {
        let pruned = graph(&[("a", 3)], &[("a", "a", 2)]);
        let layout = compute_layout(&pruned, Some("a"), &LayoutOptions::default());
        assert_eq!(layout.method, LayoutMethod::Layered);
        assert_eq!(layout.nodes.len(), 1);
        assert!(matches!(
            layout.edges[0].route,
            EdgeRoute::SelfLoop { .. }
        ));
    }

    #[test]
    fn test_empty_graph() {
        let layout = compute_layout(&PrunedGraph::default(), None, &LayoutOptions::default());
        assert!(layout.nodes.is_empty());
        assert_eq!(layout.start_activity, None);
        assert_eq!((layout.width, layout.height), (0.0, 0.0));
    }
}
