//! Persistent record storage and the two-phase construction protocol.
//!
//! A [`Record`] is an immutable instance of a declared type: a schema plus a
//! slot sequence. "Setting" a slot produces a new record, a *revision*,
//! whose sequence is a fresh shallow copy of the original's; the values
//! themselves are shared by reference. A [`Draft`] is the only thing that
//! mutates slots in place, and it exists only until `finish()` seals it.

use crate::{Action, Field, Schema, SlotData, SlotValue};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An immutable instance of a declared type.
///
/// Cloning a record is aliasing: the clone shares the original's slot
/// sequence and compares as the same revision. Only [`Record::with`] (and
/// the typed setters built on it) produces a new revision.
#[derive(Clone)]
pub struct Record {
    schema: Arc<Schema>,
    slots: Arc<[Option<SlotValue>]>,
}

impl Record {
    pub(crate) fn sealed(schema: Arc<Schema>, slots: Vec<Option<SlotValue>>) -> Self {
        Record {
            schema,
            slots: slots.into(),
        }
    }

    /// The schema of this record's runtime type.
    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The declared name of this record's runtime type.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    /// Read a slot, falling back to the property's declared default.
    /// Returns `None` when the slot is unset and no default was declared.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<&SlotValue> {
        match self.slots.get(slot) {
            Some(Some(value)) => Some(value),
            _ => self.schema.default(slot),
        }
    }

    /// Produce a revision with `value` stored at `slot`.
    ///
    /// The new record shares this record's schema (writing through a base
    /// type's handle never changes an instance's runtime type) and every
    /// other slot value. This record is left untouched.
    pub fn with(&self, slot: usize, value: SlotValue) -> Record {
        let mut slots: Vec<Option<SlotValue>> = self.slots.to_vec();
        if slots.len() <= slot {
            slots.resize(slot + 1, None);
        }
        slots[slot] = Some(value);
        Record {
            schema: self.schema.clone(),
            slots: slots.into(),
        }
    }

    /// Revision identity: true when both records hold the same slot
    /// sequence. Clones are the same revision; `with` never is.
    #[inline]
    pub fn is_same(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }

    /// Run the reducer registered for `action`'s kind on this record's
    /// type. An unregistered kind returns this record unchanged (same
    /// revision).
    pub fn reduce(&self, action: &Action) -> Record {
        match self.schema.reducer(action.kind()) {
            Some(reduce) => reduce(self, action.payload()),
            None => self.clone(),
        }
    }

    /// Render this record as plain JSON: `{property: resolved value}` in
    /// declaration order, recursing through nested records and collections.
    /// Properties that are unset with no declared default are omitted.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (slot, prop) in self.schema.prop_defs().iter().enumerate() {
            if self.schema.slot_of(&prop.name) != Some(slot) {
                continue; // shadowed by a redeclaration
            }
            if let Some(value) = self.get(slot) {
                map.insert(prop.name.clone(), value.to_json());
            }
        }
        Value::Object(map)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct(self.schema.name());
        for (slot, prop) in self.schema.prop_defs().iter().enumerate() {
            if let Some(value) = self.get(slot) {
                dbg.field(&prop.name, &value.to_json());
            }
        }
        dbg.finish()
    }
}

/// An instance under construction.
///
/// Drafts are the construction-phase exception to immutability: every write
/// mutates the draft in place and chains. `finish()` seals the draft into a
/// record, after which all writes clone. A subtype's constructor can run its
/// base type's init logic on the same draft before its own; nothing special
/// is needed for nested construction.
pub struct Draft {
    schema: Arc<Schema>,
    slots: Vec<Option<SlotValue>>,
}

impl Draft {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        let len = schema.len();
        Draft {
            schema,
            slots: vec![None; len],
        }
    }

    /// Write a property in place.
    #[inline]
    pub fn set<T: SlotData>(&mut self, field: &Field<T>, value: T) -> &mut Self {
        self.put(field.slot(), value.into_slot())
    }

    /// Write a raw slot in place.
    pub fn put(&mut self, slot: usize, value: SlotValue) -> &mut Self {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = Some(value);
        self
    }

    /// Seal the draft into an immutable record.
    pub fn finish(self) -> Record {
        Record::sealed(self.schema, self.slots)
    }
}

/// A typed wrapper over a [`Record`].
///
/// Implemented by the structs the [`persistent!`](crate::persistent) macro
/// generates, and by `Record` itself for untyped use.
pub trait Persistent: Clone + Sized + 'static {
    /// The underlying record.
    fn record(&self) -> &Record;

    /// Wrap a record.
    fn from_record(record: Record) -> Self;

    /// Unwrap into the underlying record.
    fn into_record(self) -> Record {
        self.record().clone()
    }

    /// Reduce with the action registered for its kind; unregistered kinds
    /// return the same revision.
    fn reduce(&self, action: &Action) -> Self {
        Self::from_record(self.record().reduce(action))
    }

    /// Revision identity (see [`Record::is_same`]).
    fn is_same(&self, other: &Self) -> bool {
        self.record().is_same(other.record())
    }

    /// JSON serialization hook (see [`Record::to_json`]).
    fn to_json(&self) -> Value {
        self.record().to_json()
    }
}

impl Persistent for Record {
    fn record(&self) -> &Record {
        self
    }

    fn from_record(record: Record) -> Self {
        record
    }

    fn into_record(self) -> Record {
        self
    }
}

/// Generate the wrapper struct for a persistent type.
///
/// Expands to a one-field struct holding a [`Record`] plus its
/// [`Persistent`] and [`SlotData`] impls. Property accessors and the type's
/// registration call are written by hand against the type's
/// [`TypeDef`](crate::TypeDef).
#[macro_export]
macro_rules! persistent {
    ($(#[$attr:meta])* $vis:vis struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone)]
        $vis struct $name {
            record: $crate::Record,
        }

        impl $crate::Persistent for $name {
            fn record(&self) -> &$crate::Record {
                &self.record
            }

            fn from_record(record: $crate::Record) -> Self {
                Self { record }
            }

            fn into_record(self) -> $crate::Record {
                self.record
            }
        }

        impl $crate::SlotData for $name {
            fn into_slot(self) -> $crate::SlotValue {
                $crate::SlotValue::Object(self.record)
            }

            fn from_slot(value: &$crate::SlotValue) -> ::std::option::Option<Self> {
                value.as_object().map(|record| Self {
                    record: record.clone(),
                })
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(&self.record, f)
            }
        }
    };
}
