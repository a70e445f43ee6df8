//! Operation Pipeline
//!
//! An [`OperationPipeline`] owns an immutable original [`crate::core::EventLog`], an ordered list of
//! [`Operation`]s and the log derived by replaying them. All changes of the derived log go through
//! the pipeline and can be undone and redone.

/// Operation descriptors and request parsing
pub mod operation;
#[doc(hidden)]
pub mod pipeline_struct;

#[doc(inline)]
pub use operation::Operation;
#[doc(inline)]
pub use pipeline_struct::{replay, OperationPipeline, PipelineOptions, SnapshotPolicy};
