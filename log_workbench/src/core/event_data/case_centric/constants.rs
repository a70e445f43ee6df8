/// Column name of the activity in the flattened event table
///
/// Follows the concept XES extension (and the `PM4Py` dataframe convention)
pub const ACTIVITY_NAME: &str = "concept:name";
/// Column name of the event timestamp in the flattened event table
pub const TIMESTAMP_NAME: &str = "time:timestamp";
/// Prefix prepended to case-level keys when flattening an event log to events only
pub const CASE_PREFIX: &str = "case:";
/// Constructed combination of [`CASE_PREFIX`] and [`ACTIVITY_NAME`], i.e., the case identifier column
pub const PREFIXED_CASE_ID_NAME: &str = "case:concept:name";
/// Separator used when joining the unique values of merged events into one string
pub const JOINED_VALUES_SEPARATOR: &str = "|";

/// Column names that are always present in the flattened event table
pub const RESERVED_COLUMNS: [&str; 3] = [PREFIXED_CASE_ID_NAME, ACTIVITY_NAME, TIMESTAMP_NAME];
