//! Named actions and their reducers.
//!
//! An [`Action`] is an immutable `{kind, payload}` record. An [`ActionDef`]
//! pairs a bound name with a reducer and constructs actions carrying typed
//! payloads. Reducers are erased to record level when the def is created,
//! which is what lets a subtype re-register a base type's action under its
//! own name without any downcasting.

use crate::{Persistent, Record};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A record-level reducer: the unit stored in per-type reducer tables.
pub type Reducer = Arc<dyn Fn(&Record, &Payload) -> Record + Send + Sync>;

const UNNAMED: &str = "(unnamed)";

/// A cloneable, type-erased action payload.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    /// Wrap a value as a payload.
    #[inline]
    pub fn new<P: Send + Sync + 'static>(value: P) -> Self {
        Payload(Arc::new(value))
    }

    /// The empty payload.
    #[inline]
    pub fn none() -> Self {
        Payload::new(())
    }

    /// Borrow the payload as a concrete type.
    #[inline]
    pub fn downcast_ref<P: 'static>(&self) -> Option<&P> {
        self.0.downcast_ref::<P>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&"<opaque>").finish()
    }
}

/// An action: a named, immutable state-transition request.
///
/// Action identity is its `kind` string: dispatch looks the kind up in the
/// receiving type's reducer table. The payload is opaque to everything but
/// the reducer registered for that kind.
#[derive(Clone)]
pub struct Action {
    kind: Arc<str>,
    payload: Payload,
}

impl Action {
    /// Create an action with the given kind and payload.
    #[inline]
    pub fn new(kind: impl Into<Arc<str>>, payload: Payload) -> Self {
        Action {
            kind: kind.into(),
            payload,
        }
    }

    /// The action's kind name.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The action's payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("kind", &self.kind).finish()
    }
}

/// An action constructor: a bound name plus the reducer that handles it.
///
/// Defs are created unnamed by [`action`] / [`simple_action`] and bound to
/// their final name when registered on a type via
/// [`SchemaBuilder::action`](crate::SchemaBuilder::action).
pub struct ActionDef<P> {
    name: Arc<str>,
    reduce: Reducer,
    _payload: PhantomData<fn(P)>,
}

impl<P> Clone for ActionDef<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            reduce: self.reduce.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P: Send + Sync + 'static> ActionDef<P> {
    /// The currently bound name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rebind this def to a new name, keeping the same reducer.
    ///
    /// Renaming to the current name is idempotent: the returned def shares
    /// this def's reducer either way.
    pub fn named(&self, name: &str) -> Self {
        if &*self.name == name {
            return self.clone();
        }
        Self {
            name: Arc::from(name),
            reduce: self.reduce.clone(),
            _payload: PhantomData,
        }
    }

    /// Construct an action carrying `payload`.
    #[inline]
    pub fn of(&self, payload: P) -> Action {
        Action::new(self.name.clone(), Payload::new(payload))
    }

    pub(crate) fn reducer(&self) -> &Reducer {
        &self.reduce
    }

    pub(crate) fn from_parts(name: Arc<str>, reduce: Reducer) -> Self {
        Self {
            name,
            reduce,
            _payload: PhantomData,
        }
    }
}

impl ActionDef<()> {
    /// Construct a payload-less action.
    #[inline]
    pub fn make(&self) -> Action {
        self.of(())
    }
}

/// Create an unnamed action def from a typed reducer.
///
/// The reducer receives the current state and the action's payload and
/// returns the next state. A dispatched payload that is not a `P` reduces
/// like an unregistered action: the state comes back unchanged.
pub fn action<S, P, F>(reduce: F) -> ActionDef<P>
where
    S: Persistent,
    P: Send + Sync + 'static,
    F: Fn(&S, &P) -> S + Send + Sync + 'static,
{
    let reduce: Reducer = Arc::new(move |record: &Record, payload: &Payload| {
        match payload.downcast_ref::<P>() {
            Some(payload) => reduce(&S::from_record(record.clone()), payload).into_record(),
            None => record.clone(),
        }
    });
    ActionDef::from_parts(Arc::from(UNNAMED), reduce)
}

/// Create an unnamed, payload-less action def from a typed reducer.
pub fn simple_action<S, F>(reduce: F) -> ActionDef<()>
where
    S: Persistent,
    F: Fn(&S) -> S + Send + Sync + 'static,
{
    action(move |state: &S, _: &()| reduce(state))
}
