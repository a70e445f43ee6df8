//! Errors reported by transforms and the operation pipeline

use thiserror::Error;

/// Error reported by a transform, an operation request or a pipeline call
///
/// Every variant is recoverable at the pipeline-call boundary: a call that
/// returns one of these leaves the pipeline state exactly as it was before.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Applying an operation would leave the log without any case
    #[error("Operation #{index} ({description}) would leave the event log empty")]
    EmptyLogAfterOperation {
        /// Position of the offending operation in the operation list
        index: usize,
        /// Human-readable description of the offending operation
        description: String,
    },

    /// A filter expression could not be parsed
    #[error("Invalid expression '{expression}': {reason}")]
    InvalidExpression {
        /// The expression source text
        expression: String,
        /// Why parsing failed
        reason: String,
    },

    /// An operation references a column that is not present in the current log
    #[error("Field '{field}' not found in the event log")]
    FieldNotFound {
        /// The missing column name
        field: String,
    },

    /// Imported rows were dropped because their timestamps could not be parsed
    #[error("{dropped} row(s) dropped because of malformed timestamps")]
    MalformedTimestamp {
        /// Number of dropped rows
        dropped: usize,
    },

    /// Undo was requested but the history is empty
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo was requested but no operation was undone
    #[error("Nothing to redo")]
    NothingToRedo,

    /// An operation request is structurally invalid
    #[error("Invalid operation parameters: {0}")]
    InvalidOperationParameters(String),

    /// The event log handed to the pipeline violates a data model invariant
    #[error("Invalid event log: {0}")]
    InvalidLog(String),
}

impl OperationError {
    /// Whether this error is purely informational (e.g., nothing left to undo)
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            OperationError::NothingToUndo | OperationError::NothingToRedo
        )
    }

    pub(crate) fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        OperationError::InvalidOperationParameters(message.into())
    }
}
