//! Cursors: pinned state snapshots paired with a dispatch function.
//!
//! A cursor captures its snapshot once, at creation. Dispatching through it
//! updates the owning store but never the cursor; callers re-derive a
//! cursor from the store to observe new state. This makes cursors safe to
//! hand out freely: they are values, not live views.

use crate::Action;
use std::fmt;
use std::sync::Arc;

/// The dispatch half of a cursor: forwards an action to the owning store.
pub type Dispatcher = Arc<dyn Fn(Action) + Send + Sync>;

/// A pinned (snapshot, dispatch) pair.
pub struct Cursor<S> {
    snapshot: S,
    dispatch: Dispatcher,
}

impl<S> Cursor<S> {
    /// Create a cursor over `snapshot`, forwarding actions to `dispatch`.
    pub fn new(snapshot: S, dispatch: Dispatcher) -> Self {
        Cursor { snapshot, dispatch }
    }

    /// The snapshot captured when this cursor was created. Never updated.
    #[inline]
    pub fn get(&self) -> &S {
        &self.snapshot
    }

    /// Forward an action to the owning dispatch function and return the
    /// (stale) snapshot.
    pub fn dispatch(&self, action: Action) -> &S {
        (self.dispatch)(action);
        &self.snapshot
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatch
    }
}

impl<S: Clone> Clone for Cursor<S> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Cursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

/// Anything exposing current state and a dispatch entry point.
///
/// Implemented by [`Store`](crate::Store); implement it for third-party
/// stores to bridge them into cursors with [`cursor_from_store`].
pub trait StateSource<S> {
    /// The current state.
    fn get_state(&self) -> S;

    /// Dispatch an action.
    fn dispatch(&self, action: Action);
}

/// Adapt any [`StateSource`] into a cursor over its current state.
pub fn cursor_from_store<S, E>(store: &Arc<E>) -> Cursor<S>
where
    E: StateSource<S> + Send + Sync + 'static,
{
    let snapshot = store.get_state();
    let owner = Arc::clone(store);
    Cursor::new(snapshot, Arc::new(move |action| owner.dispatch(action)))
}
