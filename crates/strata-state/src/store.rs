//! A minimal store: the single source of truth for a persistent state tree.
//!
//! The store owns the live state and a subscriber list. Dispatch reduces the
//! current state, and only when the result is a different revision does it
//! replace the state and notify subscribers: synchronously, in subscription
//! order, strictly after the state cell has been updated, so a subscriber
//! reading the store mid-callback sees the new state.
//!
//! Re-entrant dispatch (a subscriber dispatching again before the outer call
//! returns) is queued: the nested call enqueues its action and returns, and
//! the outer dispatch loop drains it after the current notification pass.

use crate::{Action, Cursor, Persistent, StateSource};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type SubscriberFn = Arc<dyn Fn() + Send + Sync>;

struct StoreInner<S> {
    state: Mutex<S>,
    subscribers: Mutex<Vec<(u64, SubscriberFn)>>,
    next_subscriber: AtomicU64,
    queue: Mutex<VecDeque<Action>>,
    draining: AtomicBool,
}

/// A store holding a persistent state tree.
///
/// Cloning a store is cheap and yields a handle to the same live state.
pub struct Store<S: Persistent> {
    inner: Arc<StoreInner<S>>,
}

impl<S: Persistent + Send> Store<S> {
    /// Create a store with an initial state.
    pub fn new(initial: S) -> Self {
        Store {
            inner: Arc::new(StoreInner {
                state: Mutex::new(initial),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
            }),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.state.lock().unwrap().clone()
    }

    /// A fresh cursor over the current state, bound to this store's
    /// dispatch. The cursor's snapshot will not track later changes.
    pub fn cursor(&self) -> Cursor<S> {
        let snapshot = self.state();
        let inner = Arc::clone(&self.inner);
        Cursor::new(
            snapshot,
            Arc::new(move |action| Self::deliver(&inner, action)),
        )
    }

    /// Dispatch an action: reduce, and on a changed revision replace the
    /// state and notify every subscriber in subscription order.
    ///
    /// A reducer panic propagates to the caller; the state keeps its
    /// pre-dispatch value because replacement happens only after a
    /// successful reduction.
    pub fn dispatch(&self, action: Action) {
        Self::deliver(&self.inner, action);
    }

    /// Register a change handler. Returns a [`Subscription`] whose
    /// `cancel` removes the handler; dropping the subscription without
    /// cancelling leaves the handler registered for the store's lifetime.
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((id, Arc::new(handler)));
        let weak: Weak<StoreInner<S>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .subscribers
                        .lock()
                        .unwrap()
                        .retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    fn deliver(inner: &Arc<StoreInner<S>>, action: Action) {
        inner.queue.lock().unwrap().push_back(action);
        if inner.draining.swap(true, Ordering::AcqRel) {
            // A dispatch is already draining (re-entrant call from a
            // subscriber); the queued action will be picked up by it.
            return;
        }
        loop {
            let next_action = inner.queue.lock().unwrap().pop_front();
            let Some(action) = next_action else {
                inner.draining.store(false, Ordering::Release);
                // An enqueue may have raced the flag reset; re-acquire and
                // keep draining if so.
                if inner.queue.lock().unwrap().is_empty()
                    || inner.draining.swap(true, Ordering::AcqRel)
                {
                    break;
                }
                continue;
            };
            let mut state = inner.state.lock().unwrap();
            let next = state.reduce(&action);
            let changed = !next.is_same(&state);
            if changed {
                *state = next;
            }
            drop(state);
            if changed {
                let handlers: Vec<SubscriberFn> = inner
                    .subscribers
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|(_, handler)| handler.clone())
                    .collect();
                for handler in handlers {
                    handler();
                }
            }
        }
    }
}

impl<S: Persistent + Send> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Persistent + Send> StateSource<S> for Store<S> {
    fn get_state(&self) -> S {
        self.state()
    }

    fn dispatch(&self, action: Action) {
        Store::dispatch(self, action);
    }
}

/// Handle returned by [`Store::subscribe`].
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Remove the handler from the store's subscriber list.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Build a standalone reducer function around an initial state, for use
/// with third-party stores expecting `(state, action) -> state`. A missing
/// state resolves to `initial`; otherwise the action is reduced against the
/// state's own reducer table.
pub fn create_reducer<S: Persistent>(initial: S) -> impl Fn(Option<&S>, &Action) -> S {
    move |state, action| match state {
        Some(state) => state.reduce(action),
        None => initial.clone(),
    }
}
