//! # Subscription Bus
//!
//! Name-keyed listener map with synchronous, failure-isolated dispatch.

use crate::subscriber::{Listener, ListenerError, Subscription};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub(crate) struct ListenerEntry {
    pub(crate) id: u64,
    pub(crate) listener: Listener,
}

pub(crate) type ListenerMap = HashMap<String, Vec<ListenerEntry>>;

/// Trait for publishing events onto the bus.
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` under `event`.
    ///
    /// # Returns
    ///
    /// The number of listeners that handled the event without failing.
    fn publish(&self, event: &str, payload: &Value) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory subscription bus.
///
/// Owned by an explicitly constructed context rather than a global, so
/// independent instances never see each other's listeners.
pub struct SubscriptionBus {
    /// Listeners by event name, in registration order.
    listeners: Arc<RwLock<ListenerMap>>,

    /// Source of listener ids.
    next_id: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,

    /// Total listener invocations that errored or panicked.
    listener_failures: AtomicU64,
}

impl SubscriptionBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
        }
    }

    /// Register `listener` for `event`.
    ///
    /// The listener stays registered until the returned handle is dropped or
    /// unsubscribed, or until [`SubscriptionBus::unsubscribe`] clears the name.
    pub fn subscribe<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                listener: Arc::new(listener),
            });

        debug!(event = event, listener_id = id, "New subscription created");

        Subscription::new(Arc::downgrade(&self.listeners), event.to_string(), id)
    }

    /// Remove every listener registered for `event`.
    ///
    /// Returns how many listeners were removed.
    pub fn unsubscribe(&self, event: &str) -> usize {
        let removed = self
            .listeners
            .write()
            .remove(event)
            .map_or(0, |entries| entries.len());
        debug!(event = event, removed = removed, "Listeners cleared");
        removed
    }

    /// Number of listeners currently registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Total listener invocations that errored or panicked.
    #[must_use]
    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }

    /// Run one listener, containing both errors and panics.
    fn dispatch_one(&self, event: &str, id: u64, listener: &Listener, payload: &Value) -> bool {
        match catch_unwind(AssertUnwindSafe(|| listener(payload))) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                self.listener_failures.fetch_add(1, Ordering::Relaxed);
                warn!(event = event, listener_id = id, error = %e, "Listener failed");
                false
            }
            Err(_) => {
                self.listener_failures.fetch_add(1, Ordering::Relaxed);
                error!(event = event, listener_id = id, "Listener panicked");
                false
            }
        }
    }
}

impl Default for SubscriptionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for SubscriptionBus {
    fn publish(&self, event: &str, payload: &Value) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot so listeners may (un)subscribe while being dispatched.
        let snapshot: Vec<(u64, Listener)> = match self.listeners.read().get(event) {
            Some(entries) => entries
                .iter()
                .map(|entry| (entry.id, entry.listener.clone()))
                .collect(),
            None => Vec::new(),
        };

        if snapshot.is_empty() {
            debug!(event = event, "Event dropped (no listeners)");
            return 0;
        }

        let delivered = snapshot
            .iter()
            .filter(|(id, listener)| self.dispatch_one(event, *id, listener, payload))
            .count();

        debug!(
            event = event,
            listeners = snapshot.len(),
            delivered = delivered,
            "Event published"
        );
        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
