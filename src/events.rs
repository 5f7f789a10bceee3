//! Change Notifications
//!
//! Minimal publish/subscribe emitter shared by stores and views. Listeners run
//! synchronously inside `emit`, in subscription order.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by [`Emitter::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Synchronous event emitter
pub struct Emitter<E> {
    listeners: RwLock<Vec<(Subscription, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> Emitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let subscription = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .push((subscription, Arc::new(listener)));
        subscription
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }

    /// Deliver an event to every listener
    ///
    /// The listener list is snapshotted first; listeners may subscribe,
    /// unsubscribe or read the emitting object without deadlocking.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}
