//! Ordered synchronous publish/subscribe.
//!
//! Handlers run on the publishing task, one after another, in the order
//! they subscribed. The subscriber list is snapshotted before delivery, so
//! handlers may subscribe or unsubscribe while an event is being delivered.
//! A panicking handler is logged and skipped; later handlers still run.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{error, trace};

use crate::identifiers::SubscriptionId;

use super::{Event, EventName};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// One registered handler.
struct Subscriber {
    id: SubscriptionId,
    handler: EventHandler,
}

// ============================================================================
// EventBus
// ============================================================================

/// Flat mapping from event name to ordered subscriber list.
#[derive(Default)]
pub struct EventBus {
    /// Subscribers per event name, in subscription order.
    subscribers: RwLock<FxHashMap<EventName, Vec<Subscriber>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a handler to an event name.
    ///
    /// Returns the ID to pass to [`EventBus::unsubscribe`].
    pub fn subscribe<F>(&self, name: EventName, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId::generate();
        self.subscribers
            .write()
            .entry(name)
            .or_default()
            .push(Subscriber {
                id,
                handler: Arc::new(handler),
            });

        trace!(%name, %id, "Subscribed");
        id
    }

    /// Removes one handler.
    ///
    /// Returns `false` if no handler with that ID is subscribed to `name`.
    pub fn unsubscribe(&self, name: EventName, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(list) = subscribers.get_mut(&name) else {
            return false;
        };

        let before = list.len();
        list.retain(|subscriber| subscriber.id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            subscribers.remove(&name);
        }

        removed
    }

    /// Delivers an event to every handler subscribed to its name.
    ///
    /// Returns the number of handlers that completed without panicking.
    pub fn publish(&self, event: &Event) -> usize {
        let name = event.name();
        let handlers: Vec<EventHandler> = match self.subscribers.read().get(&name) {
            Some(list) => list.iter().map(|s| Arc::clone(&s.handler)).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(%name, "Event handler panicked"),
            }
        }

        trace!(%name, delivered, "Event published");
        delivered
    }

    /// Returns the number of handlers subscribed to a name.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.subscribers.read().get(&name).map_or(0, Vec::len)
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.read();
        let mut map = f.debug_map();
        for (name, list) in subscribers.iter() {
            map.entry(name, &list.len());
        }
        map.finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
