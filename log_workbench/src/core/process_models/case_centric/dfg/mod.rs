//! Directly-follows graphs
/// [`DirectlyFollowsGraph`] struct
pub mod dfg_struct;
/// Positioning a [`PrunedGraph`] for rendering
pub mod layout;
/// Keeping only the most frequent part of a [`DirectlyFollowsGraph`]
pub mod pruning;

#[doc(inline)]
pub use dfg_struct::{Activity, DirectlyFollowsGraph};
#[doc(inline)]
pub use layout::{
    compute_layout, EdgeRoute, LayoutEdge, LayoutGraph, LayoutMethod, LayoutNode, LayoutOptions,
    LoopSide,
};
#[doc(inline)]
pub use pruning::{prune_dfg, PrunedEdge, PrunedGraph, PrunedNode};
