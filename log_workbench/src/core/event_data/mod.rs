//! Event Data
//!
//! Fundamental structs and adjacent utilities for event logs
pub mod case_centric;
pub mod timestamp_utils;
#[cfg(test)]
mod tests;

#[doc(inline)]
pub use case_centric::EventLog;
