//! Dynamic values stored in record slots.
//!
//! Every variant is reference-backed, so cloning a `SlotValue` shares the
//! underlying data instead of copying it. This is what makes revisions cheap:
//! copying a slot sequence bumps reference counts, nothing more.

use crate::Record;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A value held in one slot of a persistent record.
#[derive(Clone, Debug)]
pub enum SlotValue {
    /// Plain data: scalars, strings, or arbitrary JSON.
    Data(Arc<Value>),
    /// A nested persistent object.
    Object(Record),
    /// A positional collection. Absent positions are holes, not errors.
    Seq(Arc<Vec<Option<SlotValue>>>),
    /// A key-addressed collection.
    Keyed(Arc<BTreeMap<String, SlotValue>>),
}

impl SlotValue {
    /// Wrap plain data in a slot value.
    #[inline]
    pub fn data(value: impl Into<Value>) -> Self {
        SlotValue::Data(Arc::new(value.into()))
    }

    /// Get the plain data if this is a `Data` value.
    #[inline]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            SlotValue::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Get the nested record if this is an `Object` value.
    #[inline]
    pub fn as_object(&self) -> Option<&Record> {
        match self {
            SlotValue::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Returns true if this is a collection value (`Seq` or `Keyed`).
    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self, SlotValue::Seq(_) | SlotValue::Keyed(_))
    }

    /// Render this value as plain JSON, recursing through nested records
    /// and collections. Holes in positional collections become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            SlotValue::Data(value) => (**value).clone(),
            SlotValue::Object(record) => record.to_json(),
            SlotValue::Seq(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Some(value) => value.to_json(),
                        None => Value::Null,
                    })
                    .collect(),
            ),
            SlotValue::Keyed(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for SlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<Value> for SlotValue {
    fn from(value: Value) -> Self {
        SlotValue::Data(Arc::new(value))
    }
}
