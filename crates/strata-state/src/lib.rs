//! Persistent objects with clone-on-write revisions, plus a thin
//! action/reducer/store layer on top.
//!
//! # Core Concepts
//!
//! - **Record**: an immutable instance of a declared type: a schema plus a
//!   slot sequence. Setting a property yields a new *revision* sharing every
//!   unchanged value with the original.
//! - **Draft**: the construction-phase exception. Writes mutate in place
//!   until `finish()` seals the record.
//! - **TypeDef / SchemaBuilder**: the one-time registration step that
//!   declares a type's properties, assigns slot indices, and wires actions.
//!   Extending a type copies its slot and reducer tables, so subtypes are
//!   independent of their base and of each other.
//! - **Field / Coll**: typed property handles produced at declaration time;
//!   the accessors for reading, revising, and binding sub-cursors.
//! - **Action / ActionDef**: named state transitions with opaque payloads,
//!   registered into per-type reducer tables.
//! - **Cursor / Store**: a pinned (snapshot, dispatch) pair, and the minimal
//!   store that reduces on dispatch and notifies subscribers on change.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::OnceLock;
//! use strata_state::{
//!     persistent, simple_action, ActionDef, Field, Persistent, Store, TypeDef,
//! };
//!
//! persistent!(pub struct Counter);
//!
//! struct CounterProps {
//!     value: Field<i64>,
//!     increment: ActionDef<()>,
//! }
//!
//! fn counter_def() -> &'static TypeDef<CounterProps> {
//!     static DEF: OnceLock<TypeDef<CounterProps>> = OnceLock::new();
//!     DEF.get_or_init(|| {
//!         TypeDef::define("Counter", |b| CounterProps {
//!             value: b.field_with("value", 0i64),
//!             increment: b.action(
//!                 "increment",
//!                 simple_action(|c: &Counter| c.with_value(c.value() + 1)),
//!             ),
//!         })
//!     })
//! }
//!
//! impl Counter {
//!     pub fn new() -> Self {
//!         Self::from_record(counter_def().record())
//!     }
//!
//!     pub fn value(&self) -> i64 {
//!         counter_def().props().value.get(self.record()).unwrap_or(0)
//!     }
//!
//!     pub fn with_value(&self, value: i64) -> Self {
//!         Self::from_record(counter_def().props().value.set(self.record(), value))
//!     }
//! }
//!
//! let counter = Counter::new();
//! let revised = counter.with_value(10);
//! assert_eq!(counter.value(), 0); // original untouched
//! assert_eq!(revised.value(), 10);
//!
//! let store = Store::new(Counter::new());
//! store.dispatch(counter_def().props().increment.make());
//! assert_eq!(store.state().value(), 1);
//! ```
//!
//! # Revisions, not mutations
//!
//! ```text
//! next = field.set(&current, value)
//! ```
//!
//! - `current` is never changed; `next` shares everything else with it.
//! - Revision identity (`is_same`) is what the store compares on dispatch:
//!   reducers that return the same revision produce no notification.
//! - Serialization: every record renders to plain JSON, property name →
//!   resolved value, recursively.

mod accessor;
mod action;
mod cursor;
mod error;
mod mapper;
mod record;
mod schema;
mod store;
mod value;

pub use accessor::{Coll, Field, SlotData};
pub use action::{action, simple_action, Action, ActionDef, Payload, Reducer};
pub use cursor::{cursor_from_store, Cursor, Dispatcher, StateSource};
pub use error::{StrataError, StrataResult};
pub use mapper::{Address, KeyMapper, Mapper, SeqMapper};
pub use record::{Draft, Persistent, Record};
pub use schema::{Schema, SchemaBuilder, TypeDef};
pub use store::{create_reducer, Store, Subscription};
pub use value::SlotValue;
