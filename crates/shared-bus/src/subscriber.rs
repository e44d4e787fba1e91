//! # Subscriptions
//!
//! Listener types and the handle returned by [`crate::SubscriptionBus::subscribe`].

use crate::publisher::ListenerMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::debug;

/// Error a listener may report. It is logged by the bus and never reaches
/// the publisher or the other listeners.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The payload did not have the shape the listener expects.
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// Any other listener-side failure.
    #[error("Listener failed: {0}")]
    Failed(String),
}

/// A bus listener. Called synchronously with the published payload.
pub type Listener = Arc<dyn Fn(&Value) -> Result<(), ListenerError> + Send + Sync>;

/// A subscription handle.
///
/// Dropping the handle removes the listener. Call [`Subscription::detach`]
/// to keep the listener registered for the lifetime of the bus.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    inner: Option<SubscriptionInner>,
}

struct SubscriptionInner {
    listeners: Weak<RwLock<ListenerMap>>,
    event: String,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(listeners: Weak<RwLock<ListenerMap>>, event: String, id: u64) -> Self {
        Self {
            inner: Some(SubscriptionInner {
                listeners,
                event,
                id,
            }),
        }
    }

    /// Event name this subscription listens to.
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        self.inner.as_ref().map(|inner| inner.event.as_str())
    }

    /// Whether the listener is still registered on the bus.
    ///
    /// Turns `false` once [`crate::SubscriptionBus::unsubscribe`] clears the
    /// event name or the bus is dropped.
    #[must_use]
    pub fn is_active(&self) -> bool {
        let Some(inner) = self.inner.as_ref() else {
            return false;
        };
        let Some(listeners) = inner.listeners.upgrade() else {
            return false;
        };
        let map = listeners.read();
        map.get(&inner.event)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == inner.id))
    }

    /// Remove this listener. Returns `false` if it was already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.remove()
    }

    /// Keep the listener registered after the handle is dropped.
    pub fn detach(mut self) {
        self.inner = None;
    }

    fn remove(&mut self) -> bool {
        let Some(inner) = self.inner.take() else {
            return false;
        };
        let Some(listeners) = inner.listeners.upgrade() else {
            return false;
        };

        let mut map = listeners.write();
        let Some(entries) = map.get_mut(&inner.event) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != inner.id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            map.remove(&inner.event);
        }

        debug!(event = %inner.event, listener_id = inner.id, "Subscription removed");
        removed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use crate::publisher::{EventPublisher, SubscriptionBus};
    use serde_json::json;

    #[test]
    fn test_drop_removes_listener() {
        let bus = SubscriptionBus::new();
        {
            let _sub = bus.subscribe("evt", |_| Ok(()));
            assert_eq!(bus.listener_count("evt"), 1);
        }
        assert_eq!(bus.listener_count("evt"), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let bus = SubscriptionBus::new();
        bus.subscribe("evt", |_| Ok(())).detach();
        assert_eq!(bus.listener_count("evt"), 1);
        assert_eq!(bus.publish("evt", &json!(null)), 1);
    }

    #[test]
    fn test_is_active_tracks_bulk_removal() {
        let bus = SubscriptionBus::new();
        let sub = bus.subscribe("evt", |_| Ok(()));
        let other = bus.subscribe("other", |_| Ok(()));
        assert!(sub.is_active());

        bus.unsubscribe("evt");
        assert!(!sub.is_active());
        assert!(other.is_active());

        // A new listener under the same name does not revive the old handle.
        let _again = bus.subscribe("evt", |_| Ok(()));
        assert!(!sub.is_active());
    }

    #[test]
    fn test_unsubscribe_after_bulk_removal() {
        let bus = SubscriptionBus::new();
        let sub = bus.subscribe("evt", |_| Ok(()));
        assert_eq!(bus.unsubscribe("evt"), 1);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = SubscriptionBus::new();
        let sub = bus.subscribe("evt", |_| Ok(()));
        assert_eq!(sub.event(), Some("evt"));
        drop(bus);
        assert!(!sub.unsubscribe());
    }
}
