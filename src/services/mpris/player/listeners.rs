use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use tracing::error;

use crate::services::mpris::{PlayerProperty, PropertyName};

type Listener = Arc<dyn Fn(&PlayerProperty) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_property: HashMap<PropertyName, Vec<(u64, Listener)>>,
}

/// Per-handle publish/subscribe for property mutations.
///
/// Listeners for the same property run in registration order. A listener
/// that panics is logged and skipped; its siblings still run.
#[derive(Default)]
pub struct PropertyChangeBus {
    listeners: Arc<Mutex<Listeners>>,
}

/// Registration returned by [`PropertyChangeBus::subscribe`].
///
/// Dropping it keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    listeners: Weak<Mutex<Listeners>>,
    property: PropertyName,
    id: u64,
}

impl PropertyChangeBus {
    /// Register `callback` for changes of `property`.
    pub fn subscribe<F>(&self, property: PropertyName, callback: F) -> Subscription
    where
        F: Fn(&PlayerProperty) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners
            .by_property
            .entry(property)
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            property,
            id,
        }
    }

    /// Deliver `change` to every listener of its property.
    pub fn emit(&self, change: &PlayerProperty) {
        let property = change.name();
        let snapshot: Vec<Listener> = {
            let listeners = lock(&self.listeners);
            match listeners.by_property.get(&property) {
                Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };

        for listener in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(change)));
            if outcome.is_err() {
                error!(?property, "Property listener panicked");
            }
        }
    }

    /// Number of listeners registered for `property`.
    pub fn listener_count(&self, property: PropertyName) -> usize {
        lock(&self.listeners)
            .by_property
            .get(&property)
            .map_or(0, Vec::len)
    }

    /// Drop every listener.
    pub fn clear(&self) {
        lock(&self.listeners).by_property.clear();
    }
}

impl Subscription {
    /// Remove the listener. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };

        let mut listeners = lock(&listeners);
        if let Some(entries) = listeners.by_property.get_mut(&self.property) {
            entries.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    match listeners.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
