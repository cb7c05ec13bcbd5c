//! Pending request table and deferred results.
//!
//! Holds at most one resolver per [`RequestKind`]. Registering a second
//! resolver of the same kind replaces the first: the replaced caller's
//! [`Pending`] future completes with [`Error::Orphaned`] and never
//! receives a value. Servers assume single-flight per kind, so this is
//! kept as-is rather than queued.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{AuthOutcome, RegisterOutcome, RequestKind, ServerInfo};

// ============================================================================
// Resolver
// ============================================================================

/// Single-shot completion handle for one pending request.
///
/// The variant fixes both the request kind and the resolved value type.
#[derive(Debug)]
pub enum Resolver {
    /// Resolves an authenticated message.
    AuthMessage(oneshot::Sender<AuthOutcome>),
    /// Resolves a registration.
    Register(oneshot::Sender<RegisterOutcome>),
    /// Resolves a size query.
    GetSize(oneshot::Sender<u64>),
    /// Resolves a full read.
    ReadAll(oneshot::Sender<Vec<String>>),
    /// Resolves a chunked read.
    ReadChunked(oneshot::Sender<Vec<String>>),
    /// Resolves a server info query.
    GetServerInfo(oneshot::Sender<ServerInfo>),
}

impl Resolver {
    /// Creates a resolver/future pair for an authenticated message.
    #[must_use]
    pub fn auth_message() -> (Self, Pending<AuthOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self::AuthMessage(tx), Pending::new(RequestKind::AuthMessage, rx))
    }

    /// Creates a resolver/future pair for a registration.
    #[must_use]
    pub fn register() -> (Self, Pending<RegisterOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self::Register(tx), Pending::new(RequestKind::Register, rx))
    }

    /// Creates a resolver/future pair for a size query.
    #[must_use]
    pub fn get_size() -> (Self, Pending<u64>) {
        let (tx, rx) = oneshot::channel();
        (Self::GetSize(tx), Pending::new(RequestKind::GetSize, rx))
    }

    /// Creates a resolver/future pair for a full read.
    #[must_use]
    pub fn read_all() -> (Self, Pending<Vec<String>>) {
        let (tx, rx) = oneshot::channel();
        (Self::ReadAll(tx), Pending::new(RequestKind::ReadAll, rx))
    }

    /// Creates a resolver/future pair for a chunked read.
    #[must_use]
    pub fn read_chunked() -> (Self, Pending<Vec<String>>) {
        let (tx, rx) = oneshot::channel();
        (Self::ReadChunked(tx), Pending::new(RequestKind::ReadChunked, rx))
    }

    /// Creates a resolver/future pair for a server info query.
    #[must_use]
    pub fn get_server_info() -> (Self, Pending<ServerInfo>) {
        let (tx, rx) = oneshot::channel();
        (
            Self::GetServerInfo(tx),
            Pending::new(RequestKind::GetServerInfo, rx),
        )
    }

    /// Returns the request kind this resolver answers.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::AuthMessage(_) => RequestKind::AuthMessage,
            Self::Register(_) => RequestKind::Register,
            Self::GetSize(_) => RequestKind::GetSize,
            Self::ReadAll(_) => RequestKind::ReadAll,
            Self::ReadChunked(_) => RequestKind::ReadChunked,
            Self::GetServerInfo(_) => RequestKind::GetServerInfo,
        }
    }
}

// ============================================================================
// Pending
// ============================================================================

/// Deferred result of a request.
///
/// Completes once a matching frame arrives. There is no built-in timeout;
/// wrap it in [`tokio::time::timeout`] and call `forget` on the client to
/// release the slot.
#[derive(Debug)]
#[must_use = "a pending request does nothing unless awaited"]
pub struct Pending<T> {
    /// Kind of the request, reported when orphaned.
    kind: RequestKind,
    /// Receiving half of the resolver channel.
    rx: oneshot::Receiver<T>,
}

impl<T> Pending<T> {
    fn new(kind: RequestKind, rx: oneshot::Receiver<T>) -> Self {
        Self { kind, rx }
    }

    /// Returns the request kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let kind = this.kind;
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| Error::orphaned(kind)))
    }
}

// ============================================================================
// PendingTable
// ============================================================================

/// Map from request kind to its single outstanding resolver.
#[derive(Debug, Default)]
pub struct PendingTable {
    /// One slot per kind.
    slots: FxHashMap<RequestKind, Resolver>,
}

impl PendingTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a resolver, replacing any resolver of the same kind.
    ///
    /// Returns the replaced resolver. Dropping it orphans its caller.
    pub fn register(&mut self, resolver: Resolver) -> Option<Resolver> {
        let kind = resolver.kind();
        let replaced = self.slots.insert(kind, resolver);

        if replaced.is_some() {
            warn!(%kind, "Pending request replaced by a newer one of the same kind");
        }

        replaced
    }

    /// Removes and returns the resolver for a kind.
    #[inline]
    pub fn take(&mut self, kind: RequestKind) -> Option<Resolver> {
        self.slots.remove(&kind)
    }

    /// Returns `true` if a request of this kind is pending.
    #[inline]
    #[must_use]
    pub fn has(&self, kind: RequestKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Returns the pending kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<RequestKind> {
        let mut kinds: Vec<_> = self.slots.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

// ============================================================================
// Typed Resolution
// ============================================================================

impl PendingTable {
    /// Resolves a pending authenticated message.
    pub fn resolve_auth(&mut self, outcome: AuthOutcome) -> bool {
        match self.take(RequestKind::AuthMessage) {
            Some(Resolver::AuthMessage(tx)) => deliver(RequestKind::AuthMessage, tx, outcome),
            other => self.restore(other),
        }
    }

    /// Resolves a pending registration.
    pub fn resolve_register(&mut self, outcome: RegisterOutcome) -> bool {
        match self.take(RequestKind::Register) {
            Some(Resolver::Register(tx)) => deliver(RequestKind::Register, tx, outcome),
            other => self.restore(other),
        }
    }

    /// Resolves a pending size query.
    pub fn resolve_size(&mut self, size: u64) -> bool {
        match self.take(RequestKind::GetSize) {
            Some(Resolver::GetSize(tx)) => deliver(RequestKind::GetSize, tx, size),
            other => self.restore(other),
        }
    }

    /// Resolves a pending read of the given kind.
    ///
    /// Only [`RequestKind::ReadAll`] and [`RequestKind::ReadChunked`] hold
    /// message lists; other kinds are left untouched.
    pub fn resolve_read(&mut self, kind: RequestKind, messages: Vec<String>) -> bool {
        match self.take(kind) {
            Some(Resolver::ReadAll(tx) | Resolver::ReadChunked(tx)) => {
                deliver(kind, tx, messages)
            }
            other => self.restore(other),
        }
    }

    /// Resolves a pending server info query.
    pub fn resolve_server_info(&mut self, info: ServerInfo) -> bool {
        match self.take(RequestKind::GetServerInfo) {
            Some(Resolver::GetServerInfo(tx)) => deliver(RequestKind::GetServerInfo, tx, info),
            other => self.restore(other),
        }
    }

    /// Puts back a resolver taken under the wrong kind.
    fn restore(&mut self, resolver: Option<Resolver>) -> bool {
        if let Some(resolver) = resolver {
            self.slots.insert(resolver.kind(), resolver);
        }
        false
    }
}

/// Sends a value to a caller. A dropped receiver still counts as resolved.
fn deliver<T>(kind: RequestKind, tx: oneshot::Sender<T>, value: T) -> bool {
    if tx.send(value).is_err() {
        trace!(%kind, "Caller dropped pending request before resolution");
    }
    true
}

// ============================================================================
// Tests
// ============================================================================
