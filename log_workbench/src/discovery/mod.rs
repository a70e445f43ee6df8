//! Process Discovery
//!
//! Discovery summarizes event data as a process model representation; here, directly-follows graphs.
pub mod case_centric;
