//! Case-centric Event Data
/// Reserved column names and separators
pub mod constants;
#[doc(hidden)]
pub(crate) mod event_log_struct;
pub mod event_table;
#[doc(inline)]
pub use event_log_struct::*;
#[doc(inline)]
pub use event_table::{
    import_event_records, EventRow, EventTable, ImportReport, RawEventRecord, RecordImportOptions,
};
