//! Case-centric Process Discovery
pub mod dfg;
