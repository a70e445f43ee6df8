#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

///
/// Core data structures: event data and process models
///
pub mod core;

///
/// Process discovery
///
pub mod discovery;

///
/// Transform Library
///
pub mod transform;

///
/// Operation Pipeline (replay, undo/redo)
///
pub mod pipeline;

///
/// Read-only analysis of event logs
///
pub mod analysis;

/// Errors of transforms and pipeline calls
pub mod error;


#[cfg(test)]
pub use utils::test_utils;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[doc(inline)]
pub use crate::core::event_data::case_centric::{
    import_event_records, Case, Event, EventLog, RawEventRecord, RecordImportOptions,
};

#[doc(inline)]
pub use crate::core::process_models::case_centric::dfg::{
    compute_layout, prune_dfg, DirectlyFollowsGraph, LayoutGraph, LayoutOptions, PrunedGraph,
};

#[doc(inline)]
pub use crate::discovery::case_centric::dfg::{build_layout, discover_dfg};

#[doc(inline)]
pub use crate::pipeline::{replay, Operation, OperationPipeline, PipelineOptions, SnapshotPolicy};

#[doc(inline)]
pub use crate::analysis::case_centric::log_summary::{summarize_log, LogSummary};

#[doc(inline)]
pub use crate::error::OperationError;

///
/// Import an [`EventLog`] from a JSON file given by a filepath
///
/// The log is not validated; see [`EventLog::validate`].
///
pub fn import_event_log_json_from_path<P: AsRef<Path>>(path: P) -> Result<EventLog, std::io::Error> {
    let reader: BufReader<File> = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

///
/// Import an [`EventLog`] from a JSON byte slice
///
pub fn import_event_log_json_from_slice(slice: &[u8]) -> Result<EventLog, std::io::Error> {
    Ok(serde_json::from_slice(slice)?)
}

///
/// Export an [`EventLog`] to a JSON file at the specified path
///
pub fn export_event_log_json_path<P: AsRef<Path>>(
    log: &EventLog,
    path: P,
) -> Result<(), std::io::Error> {
    let writer: BufWriter<File> = BufWriter::new(File::create(path)?);
    Ok(serde_json::to_writer(writer, log)?)
}
