//! Core modules: event data and process models

pub use chrono;
pub mod event_data;

pub mod process_models;

pub use event_data::case_centric::EventLog;
pub use process_models::case_centric::dfg::DirectlyFollowsGraph;
