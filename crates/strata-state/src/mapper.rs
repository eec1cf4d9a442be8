//! Addressed access over collection values.
//!
//! A `Mapper` is the capability that lets item cursors and item reducers
//! navigate heterogeneous containers without knowing their concrete shape:
//! it provides the canonical empty collection, addressed reads, and pure
//! addressed writes. Writing `None` stores an absent value: a hole for
//! positional collections, a removed key for keyed ones.

use crate::SlotValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An address into a collection: a position or a key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    /// Positional access.
    Index(usize),
    /// Key access.
    Key(String),
}

impl Address {
    /// Get the index if this is a positional address.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Address::Index(index) => Some(*index),
            Address::Key(_) => None,
        }
    }

    /// Get the key if this is a key address.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Address::Index(_) => None,
            Address::Key(key) => Some(key),
        }
    }

    /// Render this address as a map key. Positional addresses stringify,
    /// so numeric addressing works over keyed collections.
    #[inline]
    pub fn to_key(&self) -> String {
        match self {
            Address::Index(index) => index.to_string(),
            Address::Key(key) => key.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Index(index) => write!(f, "{}", index),
            Address::Key(key) => f.write_str(key),
        }
    }
}

impl From<usize> for Address {
    fn from(index: usize) -> Self {
        Address::Index(index)
    }
}

impl From<u32> for Address {
    fn from(index: u32) -> Self {
        Address::Index(index as usize)
    }
}

impl From<u64> for Address {
    fn from(index: u64) -> Self {
        Address::Index(index as usize)
    }
}

impl From<&str> for Address {
    fn from(key: &str) -> Self {
        Address::Key(key.to_owned())
    }
}

impl From<String> for Address {
    fn from(key: String) -> Self {
        Address::Key(key)
    }
}

/// Capability for addressed access over a collection value.
///
/// `set` must never mutate its input: implementations clone the container
/// and return a new one, which is what keeps collection-valued properties
/// revision-safe.
pub trait Mapper: Send + Sync {
    /// The canonical empty collection.
    fn empty(&self) -> SlotValue;

    /// Read the item at `address`, if present.
    fn get(&self, collection: &SlotValue, address: &Address) -> Option<SlotValue>;

    /// Produce a new collection with `value` stored at `address`.
    /// `None` stores an absent value.
    fn set(&self, collection: &SlotValue, address: &Address, value: Option<SlotValue>)
        -> SlotValue;
}

/// Positional mapper over `SlotValue::Seq`.
///
/// Writes past the current length extend the sequence with holes. Removal
/// leaves a hole in place, preserving the positions of later items.
///
/// # Examples
///
/// ```
/// use strata_state::{Address, Mapper, SeqMapper, SlotValue};
///
/// let empty = SeqMapper.empty();
/// let one = SeqMapper.set(&empty, &Address::Index(2), Some(SlotValue::data(9)));
/// let item = SeqMapper.get(&one, &Address::Index(2)).unwrap();
/// assert_eq!(item.as_data().unwrap(), 9);
/// assert!(SeqMapper.get(&one, &Address::Index(0)).is_none());
/// ```
pub struct SeqMapper;

impl Mapper for SeqMapper {
    fn empty(&self) -> SlotValue {
        SlotValue::Seq(Arc::new(Vec::new()))
    }

    fn get(&self, collection: &SlotValue, address: &Address) -> Option<SlotValue> {
        let index = address.as_index()?;
        match collection {
            SlotValue::Seq(items) => items.get(index).cloned().flatten(),
            _ => None,
        }
    }

    fn set(
        &self,
        collection: &SlotValue,
        address: &Address,
        value: Option<SlotValue>,
    ) -> SlotValue {
        let Some(index) = address.as_index() else {
            return collection.clone();
        };
        let mut items = match collection {
            SlotValue::Seq(items) => items.as_ref().clone(),
            // Anything else is treated as the empty sequence.
            _ => Vec::new(),
        };
        if items.len() <= index {
            items.resize(index + 1, None);
        }
        items[index] = value;
        SlotValue::Seq(Arc::new(items))
    }
}

/// Keyed mapper over `SlotValue::Keyed`.
///
/// Positional addresses are stringified, so the same mapper serves
/// string-keyed and number-keyed use. Removal deletes the key, keeping
/// enumeration clean.
pub struct KeyMapper;

impl Mapper for KeyMapper {
    fn empty(&self) -> SlotValue {
        SlotValue::Keyed(Arc::new(Default::default()))
    }

    fn get(&self, collection: &SlotValue, address: &Address) -> Option<SlotValue> {
        match collection {
            SlotValue::Keyed(entries) => entries.get(&address.to_key()).cloned(),
            _ => None,
        }
    }

    fn set(
        &self,
        collection: &SlotValue,
        address: &Address,
        value: Option<SlotValue>,
    ) -> SlotValue {
        let mut entries = match collection {
            SlotValue::Keyed(entries) => entries.as_ref().clone(),
            _ => Default::default(),
        };
        match value {
            Some(value) => {
                entries.insert(address.to_key(), value);
            }
            None => {
                entries.remove(&address.to_key());
            }
        }
        SlotValue::Keyed(Arc::new(entries))
    }
}
