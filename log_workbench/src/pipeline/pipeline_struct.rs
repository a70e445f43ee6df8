//! Replay, snapshots and undo/redo of an operation list
use std::collections::VecDeque;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::case_centric::log_summary::{summarize_log, LogSummary};
use crate::core::event_data::case_centric::EventLog;
use crate::error::OperationError;

use super::operation::Operation;

/// What an undo/redo snapshot stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Operation list and derived log (restoring is a move)
    #[default]
    FullLog,
    /// Operation list only (restoring re-derives the log by replay)
    OperationsOnly,
}

///
/// Options for an [`OperationPipeline`]
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PipelineOptions {
    /// What undo/redo snapshots store
    #[serde(default)]
    pub snapshot_policy: SnapshotPolicy,
    /// Maximal undo depth; the oldest snapshot is dropped first (`None`: unbounded)
    #[serde(default)]
    pub max_history: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    operations: Vec<Operation>,
    derived_log: Option<EventLog>,
}

///
/// Derive a log by applying `operations` in list order, starting from `original`
///
/// A [`Operation::Reset`] restarts from `original`. Fails with [`OperationError::EmptyLogAfterOperation`]
/// at the first operation leaving no case, or with the error of the first failing operation.
/// Pure function of its arguments.
pub fn replay(original: &EventLog, operations: &[Operation]) -> Result<EventLog, OperationError> {
    let mut current = original.clone();
    for (index, operation) in operations.iter().enumerate() {
        operation.validate()?;
        current = operation.apply(&current, original)?;
        tracing::debug!(
            index,
            operation = %operation,
            cases = current.cases.len(),
            events = current.event_count(),
            "Replayed operation"
        );
        if current.is_empty() {
            return Err(OperationError::EmptyLogAfterOperation {
                index,
                description: operation.describe(),
            });
        }
    }
    Ok(current)
}

///
/// Ordered, replayable list of operations over an immutable original log with undo/redo
///
/// The derived log always equals [`replay`] of the original log and the operation list.
/// Every mutating call either commits (snapshotting the previous state for undo and clearing redo)
/// or fails and leaves the pipeline exactly as it was.
///
/// ```rust
/// use log_workbench::core::chrono::{TimeZone, Utc};
/// use log_workbench::core::event_data::case_centric::{Case, Event, EventLog};
/// use log_workbench::pipeline::{Operation, OperationPipeline};
///
/// let t = |s| Utc.timestamp_opt(s, 0).unwrap().fixed_offset();
/// let log = EventLog::from_cases(vec![
///     Case::with_events("1", vec![Event::new("A", t(0)), Event::new("B", t(1))]),
///     Case::with_events("2", vec![Event::new("A", t(0))]),
/// ]);
/// let mut pipeline = OperationPipeline::new(log).unwrap();
/// pipeline.append(Operation::FilterCaseLength { min_events: 2 }).unwrap();
/// assert_eq!(pipeline.current_log().cases.len(), 1);
///
/// // Would remove every case: rejected, nothing changes
/// assert!(pipeline.append(Operation::FilterCaseLength { min_events: 3 }).is_err());
/// assert_eq!(pipeline.operations().len(), 1);
///
/// pipeline.undo().unwrap();
/// assert_eq!(pipeline.current_log(), pipeline.original_log());
/// ```
#[derive(Debug, Clone)]
pub struct OperationPipeline {
    original_log: EventLog,
    operations: Vec<Operation>,
    derived_log: EventLog,
    undo_history: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    options: PipelineOptions,
}

impl OperationPipeline {
    /// Create a pipeline without operations over `original_log` (default options)
    pub fn new(original_log: EventLog) -> Result<Self, OperationError> {
        Self::with_options(original_log, PipelineOptions::default())
    }

    /// Create a pipeline without operations over `original_log`
    ///
    /// The log must satisfy [`EventLog::validate`] and contain at least one case.
    pub fn with_options(
        original_log: EventLog,
        options: PipelineOptions,
    ) -> Result<Self, OperationError> {
        original_log.validate()?;
        if original_log.is_empty() {
            return Err(OperationError::InvalidLog(
                "event log has no cases".to_string(),
            ));
        }
        Ok(Self {
            derived_log: original_log.clone(),
            original_log,
            operations: Vec::new(),
            undo_history: VecDeque::new(),
            redo_stack: Vec::new(),
            options,
        })
    }

    /// The log all operations are replayed from
    pub fn original_log(&self) -> &EventLog {
        &self.original_log
    }

    /// The log derived by the current operation list
    pub fn current_log(&self) -> &EventLog {
        &self.derived_log
    }

    /// The current operation list
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// History lines of the current operation list
    pub fn descriptions(&self) -> Vec<String> {
        self.operations.iter().map(Operation::describe).collect()
    }

    /// Options of this pipeline
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Whether [`OperationPipeline::undo`] would succeed
    pub fn can_undo(&self) -> bool {
        !self.undo_history.is_empty()
    }

    /// Whether [`OperationPipeline::redo`] would succeed
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of states undo can go back to
    pub fn undo_depth(&self) -> usize {
        self.undo_history.len()
    }

    /// Number of states redo can go forward to
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Summary counters of the derived log
    pub fn summary(&self) -> LogSummary {
        summarize_log(&self.derived_log)
    }

    /// Append `operation` and return the new derived log
    pub fn append(&mut self, operation: Operation) -> Result<&EventLog, OperationError> {
        if let Err(e) = operation.validate() {
            tracing::warn!(error = %e, "Rejected operation request");
            return Err(e);
        }
        let mut operations = self.operations.clone();
        operations.push(operation);
        self.commit(operations, "append")
    }

    /// Remove the operation at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<&EventLog, OperationError> {
        self.check_index(index)?;
        let mut operations = self.operations.clone();
        operations.remove(index);
        self.commit(operations, "remove")
    }

    /// Move the operation at `from_index` to `to_index` (moving to the same place is allowed)
    pub fn reorder(&mut self, from_index: usize, to_index: usize) -> Result<&EventLog, OperationError> {
        self.check_index(from_index)?;
        self.check_index(to_index)?;
        let mut operations = self.operations.clone();
        let operation = operations.remove(from_index);
        operations.insert(to_index, operation);
        self.commit(operations, "reorder")
    }

    /// Clear the operation list; the derived log becomes the original log
    pub fn reset(&mut self) -> Result<&EventLog, OperationError> {
        self.commit(Vec::new(), "reset")
    }

    /// Restore the state before the last committed change
    pub fn undo(&mut self) -> Result<&EventLog, OperationError> {
        let Some(snapshot) = self.undo_history.pop_back() else {
            tracing::info!("Nothing to undo");
            return Err(OperationError::NothingToUndo);
        };
        let (operations, derived_log) = match self.restore(&snapshot) {
            Ok(state) => state,
            Err(e) => {
                self.undo_history.push_back(snapshot);
                return Err(e);
            }
        };
        let previous = self.swap_state(operations, derived_log);
        self.redo_stack.push(previous);
        tracing::info!(operations = self.operations.len(), "Undid pipeline change");
        Ok(&self.derived_log)
    }

    /// Restore the state before the last undo
    pub fn redo(&mut self) -> Result<&EventLog, OperationError> {
        let Some(snapshot) = self.redo_stack.pop() else {
            tracing::info!("Nothing to redo");
            return Err(OperationError::NothingToRedo);
        };
        let (operations, derived_log) = match self.restore(&snapshot) {
            Ok(state) => state,
            Err(e) => {
                self.redo_stack.push(snapshot);
                return Err(e);
            }
        };
        let previous = self.swap_state(operations, derived_log);
        self.push_undo(previous);
        tracing::info!(operations = self.operations.len(), "Redid pipeline change");
        Ok(&self.derived_log)
    }

    fn check_index(&self, index: usize) -> Result<(), OperationError> {
        if index >= self.operations.len() {
            let e = OperationError::invalid_parameters(format!(
                "no operation at index {} (pipeline has {})",
                index,
                self.operations.len()
            ));
            tracing::warn!(error = %e, "Rejected pipeline change");
            return Err(e);
        }
        Ok(())
    }

    /// Replay `operations`; on success snapshot the current state and install the result
    fn commit(&mut self, operations: Vec<Operation>, action: &str) -> Result<&EventLog, OperationError> {
        let derived_log = match replay(&self.original_log, &operations) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(action, error = %e, "Rejected pipeline change");
                return Err(e);
            }
        };
        let previous = self.swap_state(operations, derived_log);
        self.push_undo(previous);
        self.redo_stack.clear();
        tracing::info!(
            action,
            operations = self.operations.len(),
            cases = self.derived_log.cases.len(),
            events = self.derived_log.event_count(),
            "Committed pipeline change"
        );
        Ok(&self.derived_log)
    }

    /// Install a new state and return the previous one as snapshot
    fn swap_state(&mut self, operations: Vec<Operation>, derived_log: EventLog) -> Snapshot {
        let operations = std::mem::replace(&mut self.operations, operations);
        let derived_log = std::mem::replace(&mut self.derived_log, derived_log);
        Snapshot {
            operations,
            derived_log: match self.options.snapshot_policy {
                SnapshotPolicy::FullLog => Some(derived_log),
                SnapshotPolicy::OperationsOnly => None,
            },
        }
    }

    fn restore(&self, snapshot: &Snapshot) -> Result<(Vec<Operation>, EventLog), OperationError> {
        let derived_log = match &snapshot.derived_log {
            Some(log) => log.clone(),
            None => replay(&self.original_log, &snapshot.operations)?,
        };
        Ok((snapshot.operations.clone(), derived_log))
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_history.push_back(snapshot);
        if let Some(max) = self.options.max_history {
            while self.undo_history.len() > max {
                self.undo_history.pop_front();
            }
        }
    }
}
