use chrono::{DateTime, FixedOffset};
use ordered_float::OrderedFloat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;

use crate::core::event_data::timestamp_utils::parse_timestamp;
use crate::error::OperationError;

use super::constants::{ACTIVITY_NAME, PREFIXED_CASE_ID_NAME, TIMESTAMP_NAME};

///
/// Possible attribute values of an event
///
/// Tip: If you know the expected `AttributeValue` type, make use of the `try_as_xxx` functions (e.g., [`AttributeValue::try_as_string`])
///
/// ```rust
/// use log_workbench::core::event_data::case_centric::AttributeValue;
/// let v = AttributeValue::Float(42.0);
///
/// let f = v.try_as_float().unwrap();
/// assert_eq!(*f, 42.0);
/// ```
///
/// [`AttributeValue`] implements [`Display`] and thus `to_string()`.
/// For null attribute values, the String `"null"` is returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "type", content = "content")]
pub enum AttributeValue {
    /// String values
    String(String),
    /// `DateTime` values
    Date(DateTime<FixedOffset>),
    /// Integer values
    Int(i64),
    /// Float values
    Float(f64),
    /// Boolean values
    Boolean(bool),
    /// Missing or explicitly empty values
    Null,
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Date(date_time) => write!(f, "{}", date_time.to_rfc3339()),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T> From<DateTime<T>> for AttributeValue
where
    T: chrono::TimeZone,
{
    fn from(value: DateTime<T>) -> Self {
        Self::Date(value.fixed_offset())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl AttributeValue {
    ///
    /// Try to get attribute value as String
    ///
    /// Returns `Some()` of inner value if value is of variant [`AttributeValue::String`] and `None` otherwise
    ///
    pub fn try_as_string(&self) -> Option<&String> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }
    ///
    /// Try to get attribute value as date
    ///
    pub fn try_as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            AttributeValue::Date(v) => Some(v),
            _ => None,
        }
    }
    ///
    /// Try to get attribute value as int
    ///
    pub fn try_as_int(&self) -> Option<&i64> {
        match self {
            AttributeValue::Int(v) => Some(v),
            _ => None,
        }
    }
    ///
    /// Try to get attribute value as float
    ///
    pub fn try_as_float(&self) -> Option<&f64> {
        match self {
            AttributeValue::Float(v) => Some(v),
            _ => None,
        }
    }
    ///
    /// Try to get attribute value as bool
    ///
    pub fn try_as_bool(&self) -> Option<&bool> {
        match self {
            AttributeValue::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this is [`AttributeValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric view of the value
    ///
    /// Strings are parsed leniently, so that columns imported as text (e.g., from CSV) still compare numerically.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    ///
    /// Compare two attribute values
    ///
    /// Numbers compare numerically (also against numeric strings, and two strings that both parse as numbers
    /// compare as numbers), dates compare chronologically (a string is parsed as timestamp when compared
    /// against a date), other strings lexicographically and booleans with `false < true`.
    /// `Null` is only comparable to `Null`.
    ///
    /// Returns `None` if the values are not comparable.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        use AttributeValue::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) | (_, Null) => None,
            (String(a), String(b)) => match (self.as_number(), other.as_number()) {
                (Some(x), Some(y)) => Some(OrderedFloat(x).cmp(&OrderedFloat(y))),
                _ => Some(a.cmp(b)),
            },
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Date(a), String(b)) => parse_timestamp(b, None).map(|b| a.cmp(&b)),
            (String(a), Date(b)) => parse_timestamp(a, None).map(|a| a.cmp(b)),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => Some(OrderedFloat(x).cmp(&OrderedFloat(y))),
                _ => None,
            },
        }
    }

    /// Loose equality used by comparisons: comparable values that are equal, or identical textual representations
    pub fn loosely_equals(&self, other: &AttributeValue) -> bool {
        match self.compare(other) {
            Some(ordering) => ordering == Ordering::Equal,
            None => !self.is_null() && !other.is_null() && self.to_string() == other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
///
/// Attribute made up of the key and value
///
pub struct Attribute {
    /// Attribute key
    pub key: String,
    /// Attribute value
    pub value: AttributeValue,
}

impl Attribute {
    ///
    /// Helper to create a new attribute
    ///
    pub fn new<K: Into<String>, V: Into<AttributeValue>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

///
/// Attributes are [`Vec`]s of [`Attribute`]s
///
/// See the [`EditableAttributes`] trait for convenient functions to add, edit or remove attributes by key.
///
/// ```rust
/// use log_workbench::core::event_data::case_centric::{Attribute, AttributeValue, EditableAttributes};
/// let attrs = vec![Attribute::new("key", 42.0)];
///
/// let f = attrs.get_by_key("key").and_then(|a| a.value.try_as_float()).unwrap();
/// assert_eq!(*f, 42.0);
/// ```
pub type Attributes = Vec<Attribute>;

///
/// Trait to easily add and update attributes
///
pub trait EditableAttributes {
    ///
    /// Add a new attribute (with key and value)
    ///
    /// Note: Does _not_ check if attribute was already present.
    ///
    fn add_to_attributes(&mut self, key: String, value: AttributeValue);
    ///
    /// Set the value of an attribute, replacing an existing attribute with the same key or appending a new one
    ///
    fn set_value(&mut self, key: &str, value: AttributeValue);
    ///
    /// Get an attribute by key
    ///
    /// _Complexity_: Does linear lookup (i.e., in O(n)).
    fn get_by_key(&self, key: &str) -> Option<&Attribute>;
    ///
    /// Get an attribute as mutable by key
    ///
    fn get_by_key_mut(&mut self, key: &str) -> Option<&mut Attribute>;
    ///
    /// Remove attribute with given key
    ///
    /// Returns `true` if the attribute was present and `false` otherwise
    ///
    fn remove_with_key(&mut self, key: &str) -> bool;
}

impl EditableAttributes for Attributes {
    fn add_to_attributes(&mut self, key: String, value: AttributeValue) {
        self.push(Attribute { key, value });
    }

    fn set_value(&mut self, key: &str, value: AttributeValue) {
        match self.get_by_key_mut(key) {
            Some(attr) => attr.value = value,
            None => self.add_to_attributes(key.to_string(), value),
        }
    }

    fn get_by_key(&self, key: &str) -> Option<&Attribute> {
        self.iter().find(|attr| attr.key == key)
    }

    fn get_by_key_mut(&mut self, key: &str) -> Option<&mut Attribute> {
        self.iter_mut().find(|attr| attr.key == key)
    }

    fn remove_with_key(&mut self, key: &str) -> bool {
        let index_opt = self.iter().position(|a| a.key == key);
        if let Some(index) = index_opt {
            self.remove(index);
            return true;
        }
        false
    }
}

///
/// An event: one occurrence of an activity at a point in time, with optional attributes
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Event {
    /// Activity name
    pub activity: String,
    /// Time the event occurred
    pub timestamp: DateTime<FixedOffset>,
    /// Additional event attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl Event {
    /// Create a new event with the provided activity and timestamp and no further attributes
    pub fn new<S: Into<String>>(activity: S, timestamp: DateTime<FixedOffset>) -> Self {
        Event {
            activity: activity.into(),
            timestamp,
            attributes: Attributes::new(),
        }
    }

    /// Builder-style helper to add an attribute
    pub fn with_attribute<K: Into<String>, V: Into<AttributeValue>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.attributes.add_to_attributes(key.into(), value.into());
        self
    }

    ///
    /// Get the value of a column of the flattened event table for this event
    ///
    /// Reserved columns ([`PREFIXED_CASE_ID_NAME`], [`ACTIVITY_NAME`], [`TIMESTAMP_NAME`]) resolve to
    /// the case id, activity and timestamp; all other names are looked up in the event attributes.
    pub fn get_field(&self, case_id: &str, name: &str) -> Option<AttributeValue> {
        match name {
            PREFIXED_CASE_ID_NAME => Some(AttributeValue::String(case_id.to_string())),
            ACTIVITY_NAME => Some(AttributeValue::String(self.activity.clone())),
            TIMESTAMP_NAME => Some(AttributeValue::Date(self.timestamp)),
            _ => self.attributes.get_by_key(name).map(|a| a.value.clone()),
        }
    }
}

///
/// A case consists of an identifier and a list of events, kept in ascending timestamp order
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct Case {
    /// Case identifier (unique within a log)
    pub id: String,
    /// Events contained in the case
    pub events: Vec<Event>,
}

impl Case {
    /// Initializes a new case with the given id and no events
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            events: Vec::new(),
        }
    }

    /// Initializes a case with the given events (sorted by timestamp)
    pub fn with_events<S: Into<String>>(id: S, events: Vec<Event>) -> Self {
        let mut case = Self {
            id: id.into(),
            events,
        };
        case.sort_by_timestamp();
        case
    }

    /// Stable sort of the events by timestamp (events with equal timestamps keep their relative order)
    pub fn sort_by_timestamp(&mut self) {
        self.events.sort_by_key(|e| e.timestamp);
    }

    /// Activity sequence of this case (i.e., its variant)
    pub fn activity_sequence(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.activity.as_str()).collect()
    }

    /// Duration between the earliest and the latest event in seconds
    ///
    /// Returns `None` for cases without events
    pub fn duration_seconds(&self) -> Option<f64> {
        let min = self.events.iter().map(|e| e.timestamp).min()?;
        let max = self.events.iter().map(|e| e.timestamp).max()?;
        Some((max - min).num_milliseconds() as f64 / 1000.0)
    }

    /// First activity of the case (in timestamp order)
    pub fn start_activity(&self) -> Option<&str> {
        self.events.first().map(|e| e.activity.as_str())
    }

    /// Last activity of the case (in timestamp order)
    pub fn end_activity(&self) -> Option<&str> {
        self.events.last().map(|e| e.activity.as_str())
    }
}

///
/// Event log consisting of a list of [`Case`]s
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct EventLog {
    /// Cases contained in the log
    pub cases: Vec<Case>,
}

impl EventLog {
    /// Initializes a new event log without cases
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an event log from a list of cases
    pub fn from_cases(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    /// Total number of events over all cases
    pub fn event_count(&self) -> usize {
        self.cases.iter().map(|c| c.events.len()).sum()
    }

    /// Whether the log has no cases
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Get a case by its identifier
    pub fn get_case(&self, id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// Sorted set of all activities occurring in the log
    pub fn activities(&self) -> BTreeSet<&str> {
        self.cases
            .iter()
            .flat_map(|c| c.events.iter().map(|e| e.activity.as_str()))
            .collect()
    }

    /// Whether the flattened event table of this log has a column with the given name
    ///
    /// Reserved columns always exist; attribute columns exist if at least one event carries the attribute.
    pub fn has_column(&self, name: &str) -> bool {
        name == PREFIXED_CASE_ID_NAME
            || name == ACTIVITY_NAME
            || name == TIMESTAMP_NAME
            || self
                .cases
                .iter()
                .flat_map(|c| c.events.iter())
                .any(|e| e.attributes.get_by_key(name).is_some())
    }

    /// Return [`OperationError::FieldNotFound`] for the first of the given columns that is absent in this log
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<(), OperationError> {
        match names.iter().find(|n| !self.has_column(n.as_ref())) {
            Some(missing) => Err(OperationError::FieldNotFound {
                field: missing.as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }

    ///
    /// Check the data model invariants of this log
    ///
    /// Case ids and activity names must be non-empty, case ids unique, no case may be empty
    /// and the events of each case must be sorted ascending by timestamp.
    pub fn validate(&self) -> Result<(), OperationError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.cases.len());
        for case in &self.cases {
            if case.id.is_empty() {
                return Err(OperationError::InvalidLog("empty case id".to_string()));
            }
            if !seen.insert(&case.id) {
                return Err(OperationError::InvalidLog(format!(
                    "duplicate case id '{}'",
                    case.id
                )));
            }
            if case.events.is_empty() {
                return Err(OperationError::InvalidLog(format!(
                    "case '{}' has no events",
                    case.id
                )));
            }
            if case.events.iter().any(|e| e.activity.is_empty()) {
                return Err(OperationError::InvalidLog(format!(
                    "case '{}' contains an event without activity",
                    case.id
                )));
            }
            if case
                .events
                .windows(2)
                .any(|w| w[0].timestamp > w[1].timestamp)
            {
                return Err(OperationError::InvalidLog(format!(
                    "events of case '{}' are not sorted by timestamp",
                    case.id
                )));
            }
        }
        Ok(())
    }
}
