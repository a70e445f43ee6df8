//! Case-centric Process Models
pub mod dfg;
