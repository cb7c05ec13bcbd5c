//! Response demultiplexer.
//!
//! Decides, for each inbound frame, which pending request it resolves and
//! whether it is also published as a message list. Rules are applied in a
//! fixed priority order; the first one that matches wins.
//!
//! | # | Frame | Pending | Effect |
//! |---|-------|---------|--------|
//! | 1 | `0x01` | auth, else register | `no_user`, else `username_taken` |
//! | 2 | `0x02` | auth | `bad_pass` |
//! | 3 | digits | size | size value |
//! | 4 | any | read all / chunked | message list to both, publish |
//! | 5 | ≥ 2 bytes | server info | `version ‖ name` |
//! | 6 | any | anything | message list, publish, auth/register `ok` |
//!
//! Error bytes that match no pending request are dropped, and so is any
//! other single byte. Everything else that matches nothing falls through
//! to rule 6, which is also how server-pushed messages arrive.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace};

use crate::protocol::{AuthOutcome, FrameKind, InboundFrame, RegisterOutcome, RequestKind};

use super::pending::{PendingTable, Resolver};

// ============================================================================
// DispatchOutcome
// ============================================================================

/// What a single dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Kinds resolved by the frame, in resolution order.
    pub resolved: Vec<RequestKind>,
    /// Message list to publish as a `messages` event.
    pub messages: Option<Vec<String>>,
}

impl DispatchOutcome {
    fn resolved(kinds: Vec<RequestKind>) -> Self {
        Self {
            resolved: kinds,
            messages: None,
        }
    }

    /// Returns `true` if the frame had no effect at all.
    #[inline]
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.resolved.is_empty() && self.messages.is_none()
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Pending table plus the priority-ordered dispatch rules.
///
/// Owned by one client; not shared between clients.
#[derive(Debug, Default)]
pub struct Dispatcher {
    /// Outstanding requests by kind.
    pending: PendingTable,
    /// Last message list delivered by rule 4 or 6.
    last_messages: Vec<String>,
}

impl Dispatcher {
    /// Creates a dispatcher with nothing pending.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a resolver. A replaced resolver is dropped, orphaning it.
    pub fn register(&mut self, resolver: Resolver) {
        drop(self.pending.register(resolver));
    }

    /// Drops the pending resolver for a kind.
    ///
    /// Returns `true` if one was pending.
    pub fn forget(&mut self, kind: RequestKind) -> bool {
        let forgotten = self.pending.take(kind).is_some();
        if forgotten {
            debug!(%kind, "Pending request forgotten");
        }
        forgotten
    }

    /// Returns `true` if a request of this kind is pending.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.has(kind)
    }

    /// Returns the pending kinds, sorted.
    #[inline]
    #[must_use]
    pub fn pending_kinds(&self) -> Vec<RequestKind> {
        self.pending.kinds()
    }

    /// Returns the last delivered message list.
    #[inline]
    #[must_use]
    pub fn last_messages(&self) -> &[String] {
        &self.last_messages
    }

    /// Classifies and dispatches raw bytes.
    pub fn dispatch_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> DispatchOutcome {
        self.dispatch(&InboundFrame::decode(bytes))
    }

    /// Dispatches one classified frame.
    pub fn dispatch(&mut self, frame: &InboundFrame) -> DispatchOutcome {
        match frame.kind() {
            FrameKind::NoUser => return self.on_no_user(),
            FrameKind::BadPass => return self.on_bad_pass(),
            FrameKind::Size(size) if self.pending.has(RequestKind::GetSize) => {
                self.pending.resolve_size(size);
                trace!(size, "Size resolved");
                return DispatchOutcome::resolved(vec![RequestKind::GetSize]);
            }
            FrameKind::Byte(byte) => {
                debug!(byte, "Unclassified single byte, dropped");
                return DispatchOutcome::default();
            }
            FrameKind::Size(_) | FrameKind::Payload => {}
        }

        if self.pending.has(RequestKind::ReadAll) || self.pending.has(RequestKind::ReadChunked) {
            return self.on_read(frame);
        }

        if self.pending.has(RequestKind::GetServerInfo)
            && let Some(info) = frame.server_info()
        {
            trace!(version = info.version, "Server info resolved");
            self.pending.resolve_server_info(info);
            return DispatchOutcome::resolved(vec![RequestKind::GetServerInfo]);
        }

        self.on_unmatched(frame)
    }

    fn on_no_user(&mut self) -> DispatchOutcome {
        if self.pending.resolve_auth(AuthOutcome::NoUser) {
            return DispatchOutcome::resolved(vec![RequestKind::AuthMessage]);
        }
        if self.pending.resolve_register(RegisterOutcome::UsernameTaken) {
            return DispatchOutcome::resolved(vec![RequestKind::Register]);
        }

        debug!("Error byte 0x01 with no pending auth or register, dropped");
        DispatchOutcome::default()
    }

    fn on_bad_pass(&mut self) -> DispatchOutcome {
        if self.pending.resolve_auth(AuthOutcome::BadPass) {
            return DispatchOutcome::resolved(vec![RequestKind::AuthMessage]);
        }

        debug!("Error byte 0x02 with no pending auth, dropped");
        DispatchOutcome::default()
    }

    fn on_read(&mut self, frame: &InboundFrame) -> DispatchOutcome {
        let messages = frame.messages();
        let mut resolved = Vec::with_capacity(2);

        for kind in [RequestKind::ReadAll, RequestKind::ReadChunked] {
            if self.pending.resolve_read(kind, messages.clone()) {
                resolved.push(kind);
            }
        }

        trace!(count = messages.len(), ?resolved, "Read resolved");
        self.last_messages.clone_from(&messages);

        DispatchOutcome {
            resolved,
            messages: Some(messages),
        }
    }

    /// Rule 6: publish as messages. No positive acknowledgement exists on
    /// the wire, so pending auth and register settle as `ok` here.
    fn on_unmatched(&mut self, frame: &InboundFrame) -> DispatchOutcome {
        let messages = frame.messages();
        let mut resolved = Vec::new();

        if self.pending.resolve_auth(AuthOutcome::Ok) {
            resolved.push(RequestKind::AuthMessage);
        }
        if self.pending.resolve_register(RegisterOutcome::Ok) {
            resolved.push(RequestKind::Register);
        }

        trace!(count = messages.len(), ?resolved, "Frame delivered as messages");
        self.last_messages.clone_from(&messages);

        DispatchOutcome {
            resolved,
            messages: Some(messages),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
