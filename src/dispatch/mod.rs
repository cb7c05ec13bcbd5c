//! Request/response correlation.
//!
//! Replies carry no request ID, so correlation is keyed by request kind:
//! at most one request of each kind is outstanding, and each inbound frame
//! is routed by the priority rules in [`demux`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `pending` | Pending table, resolvers, deferred results |
//! | `demux` | Priority-ordered frame dispatch |

// ============================================================================
// Submodules
// ============================================================================

/// Priority-ordered frame dispatch.
pub mod demux;

/// Pending request table and deferred results.
pub mod pending;

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::trace;

use crate::events::{Event, EventBus};
use crate::protocol::{InboundFrame, RequestKind};

// ============================================================================
// Re-exports
// ============================================================================

pub use demux::{DispatchOutcome, Dispatcher};
pub use pending::{Pending, PendingTable, Resolver};

// ============================================================================
// Router
// ============================================================================

/// Per-client state shared by the API and the event loop.
///
/// Frames are dispatched under the dispatcher lock; events are published
/// after it is released so handlers can issue new requests.
#[derive(Debug, Default)]
pub(crate) struct Router {
    dispatcher: Mutex<Dispatcher>,
    events: EventBus,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    /// Decodes, dispatches and publishes one inbound frame.
    pub(crate) fn route(&self, bytes: Vec<u8>) -> DispatchOutcome {
        let frame = InboundFrame::decode(bytes);
        trace!(len = frame.len(), kind = ?frame.kind(), "Frame received");

        let outcome = self.dispatcher.lock().dispatch(&frame);

        if let Some(messages) = &outcome.messages {
            self.events.publish(&Event::Messages(messages.clone()));
        }

        outcome
    }

    pub(crate) fn publish(&self, event: &Event) {
        self.events.publish(event);
    }

    pub(crate) fn register(&self, resolver: Resolver) {
        self.dispatcher.lock().register(resolver);
    }

    pub(crate) fn forget(&self, kind: RequestKind) -> bool {
        self.dispatcher.lock().forget(kind)
    }

    pub(crate) fn is_pending(&self, kind: RequestKind) -> bool {
        self.dispatcher.lock().is_pending(kind)
    }

    pub(crate) fn pending_kinds(&self) -> Vec<RequestKind> {
        self.dispatcher.lock().pending_kinds()
    }

    pub(crate) fn last_messages(&self) -> Vec<String> {
        self.dispatcher.lock().last_messages().to_vec()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    use crate::events::EventName;

    #[tokio::test]
    async fn test_route_publishes_after_resolving() {
        let router = Router::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        router.events().subscribe(EventName::Messages, move |event| {
            if let Some(messages) = event.messages() {
                seen_clone.lock().extend_from_slice(messages);
            }
        });

        let (resolver, pending) = Resolver::read_all();
        router.register(resolver);

        let outcome = router.route(b"a\nb\n\n".to_vec());
        assert_eq!(outcome.resolved, vec![RequestKind::ReadAll]);
        assert_eq!(pending.await.unwrap(), vec!["a", "b"]);
        assert_eq!(*seen.lock(), vec!["a", "b"]);
        assert_eq!(router.last_messages(), vec!["a", "b"]);
    }

    #[test]
    fn test_handler_can_register_during_publish() {
        let router = Arc::new(Router::new());
        let router_clone = Arc::clone(&router);
        router.events().subscribe(EventName::Messages, move |_| {
            router_clone.register(Resolver::get_size().0);
        });

        router.route(b"pushed".to_vec());
        assert!(router.is_pending(RequestKind::GetSize));
        assert_eq!(router.pending_kinds(), vec![RequestKind::GetSize]);
    }

    #[test]
    fn test_no_event_for_resolved_size() {
        let router = Router::new();
        router.events().subscribe(EventName::Messages, |_| panic!("unexpected"));
        router.register(Resolver::get_size().0);

        let outcome = router.route(b"42".to_vec());
        assert_eq!(outcome.resolved, vec![RequestKind::GetSize]);
        assert!(outcome.messages.is_none());
        assert!(!router.forget(RequestKind::GetSize));
    }
}
