//! wRAC client: the public operation surface.
//!
//! Every request method encodes a [`Command`], registers a resolver for its
//! kind, and queues the frame, all synchronously. The returned [`Pending`]
//! completes when the event loop dispatches a matching frame.
//!
//! # Example
//!
//! ```no_run
//! use wrac_client::{AuthOutcome, Client, EventName};
//!
//! # async fn example() -> wrac_client::Result<()> {
//! let client = Client::with_url("ws://127.0.0.1:42667")?;
//!
//! client.subscribe(EventName::Messages, |event| {
//!     if let Some(messages) = event.messages() {
//!         for message in messages {
//!             println!("{message}");
//!         }
//!     }
//! });
//!
//! client.connect().await?;
//!
//! let info = client.get_server_info()?.await?;
//! println!("Connected to {info}");
//!
//! let history = client.read_all_messages()?.await?;
//! let size = client.get_message_size()?.await?;
//! println!("{} messages, {size} bytes", history.len());
//!
//! match client.send_auth_message("bob", "secret", "hello")?.await? {
//!     AuthOutcome::Ok => {}
//!     other => eprintln!("rejected: {other}"),
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::dispatch::{DispatchOutcome, Pending, Resolver, Router};
use crate::error::{Error, Result};
use crate::events::{Event, EventName};
use crate::identifiers::SubscriptionId;
use crate::protocol::{AuthOutcome, Command, RegisterOutcome, RequestKind, ServerInfo};
use crate::transport::{Connection, ConnectionSettings, ConnectionState};

use super::builder::ClientBuilder;
use super::options::ClientOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
struct ClientInner {
    /// Transport options the client was built with.
    options: ClientOptions,
    /// Pending table, message cache and event bus.
    router: Arc<Router>,
    /// WebSocket transport adapter.
    connection: Connection,
}

// ============================================================================
// Client
// ============================================================================

/// Client for one wRAC server.
///
/// Cheap to clone; clones share the connection, pending requests and
/// subscribers. Independent clients share nothing.
///
/// At most one request of each [`RequestKind`] may be outstanding. A second
/// request of the same kind replaces the first, whose [`Pending`] then
/// completes with [`Error::Orphaned`].
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

// ============================================================================
// Client - Constructors
// ============================================================================

impl Client {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client for `url` with default options. Does not connect.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::build`].
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().url(url).build()
    }

    pub(crate) fn new(url: Url, options: ClientOptions) -> Self {
        let router = Arc::new(Router::new());
        let settings = ConnectionSettings {
            url,
            connect_timeout: options.connect_timeout,
            max_frame_size: options.max_frame_size,
        };
        let connection = Connection::new(settings, Arc::clone(&router));

        Self {
            inner: Arc::new(ClientInner {
                options,
                router,
                connection,
            }),
        }
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Opens the connection. No-op while connecting or open.
    ///
    /// # Errors
    ///
    /// See [`Connection::connect`].
    pub async fn connect(&self) -> Result<()> {
        self.inner.connection.connect().await
    }

    /// Closes the connection.
    ///
    /// Pending requests are neither rejected nor re-armed on reconnect.
    /// Watch `close` events and [`Client::forget`] them if needed.
    pub fn disconnect(&self) {
        self.inner.connection.disconnect();
    }

    /// Returns the connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Returns `true` if requests can be sent.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_open()
    }

    /// Returns the server URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        self.inner.connection.url()
    }

    /// Returns the options the client was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }
}

// ============================================================================
// Client - Commands
// ============================================================================

impl Client {
    /// Sends an unauthenticated message. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn send_message(&self, text: impl Into<String>) -> Result<()> {
        let command = Command::plain_message(text);
        self.inner.connection.send(command.encode())?;
        debug!("Plain message sent");
        Ok(())
    }

    /// Sends a message signed with account credentials.
    ///
    /// Resolves with `no_user`, `bad_pass`, or `ok` once another reply
    /// (usually a message push) arrives without an error byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn send_auth_message(
        &self,
        user: impl Into<String>,
        password: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Pending<AuthOutcome>> {
        let (resolver, pending) = Resolver::auth_message();
        self.request(&Command::auth_message(user, password, text), resolver)?;
        Ok(pending)
    }

    /// Registers an account.
    ///
    /// Resolves with `username_taken`, or `ok` once another reply arrives
    /// without an error byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn register(
        &self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Pending<RegisterOutcome>> {
        let (resolver, pending) = Resolver::register();
        self.request(&Command::register(user, password), resolver)?;
        Ok(pending)
    }

    /// Queries the message history size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn get_message_size(&self) -> Result<Pending<u64>> {
        let (resolver, pending) = Resolver::get_size();
        self.request(&Command::GetSize, resolver)?;
        Ok(pending)
    }

    /// Reads the whole message history.
    ///
    /// The reply is also published as a `messages` event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn read_all_messages(&self) -> Result<Pending<Vec<String>>> {
        let (resolver, pending) = Resolver::read_all();
        self.request(&Command::ReadAll, resolver)?;
        Ok(pending)
    }

    /// Reads history appended after `last_size` bytes.
    ///
    /// The reply is also published as a `messages` event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn read_chunked_messages(&self, last_size: u64) -> Result<Pending<Vec<String>>> {
        let (resolver, pending) = Resolver::read_chunked();
        self.request(&Command::read_chunked(last_size), resolver)?;
        Ok(pending)
    }

    /// Queries the server version and name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn get_server_info(&self) -> Result<Pending<ServerInfo>> {
        let (resolver, pending) = Resolver::get_server_info();
        self.request(&Command::GetServerInfo, resolver)?;
        Ok(pending)
    }

    /// Registers the resolver, then queues the frame.
    fn request(&self, command: &Command, resolver: Resolver) -> Result<()> {
        let kind = resolver.kind();

        if !self.inner.connection.is_open() {
            return Err(Error::NotConnected);
        }

        self.inner.router.register(resolver);

        if let Err(e) = self.inner.connection.send(command.encode()) {
            self.inner.router.forget(kind);
            return Err(e);
        }

        debug!(%kind, "Request sent");
        Ok(())
    }
}

// ============================================================================
// Client - Pending Requests
// ============================================================================

impl Client {
    /// Drops the pending request of a kind.
    ///
    /// Its [`Pending`] completes with [`Error::Orphaned`]. Use this to
    /// apply a timeout policy.
    pub fn forget(&self, kind: RequestKind) -> bool {
        self.inner.router.forget(kind)
    }

    /// Returns `true` if a request of this kind is pending.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.inner.router.is_pending(kind)
    }

    /// Returns the pending kinds, sorted.
    #[inline]
    #[must_use]
    pub fn pending_kinds(&self) -> Vec<RequestKind> {
        self.inner.router.pending_kinds()
    }

    /// Returns a snapshot of the last delivered message list.
    #[inline]
    #[must_use]
    pub fn last_messages(&self) -> Vec<String> {
        self.inner.router.last_messages()
    }

    /// Dispatches a frame as if the transport had received it.
    ///
    /// For hosts bridging frames from another transport.
    pub fn dispatch_frame(&self, bytes: impl Into<Vec<u8>>) -> DispatchOutcome {
        self.inner.router.route(bytes.into())
    }
}

// ============================================================================
// Client - Events
// ============================================================================

impl Client {
    /// Subscribes a handler to an event name.
    ///
    /// Handlers run synchronously on the connection task, in subscription
    /// order. Keep them short.
    pub fn subscribe<F>(&self, name: EventName, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.router.events().subscribe(name, handler)
    }

    /// Removes one handler.
    pub fn unsubscribe(&self, name: EventName, id: SubscriptionId) -> bool {
        self.inner.router.events().unsubscribe(name, id)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url().as_str())
            .field("state", &self.state())
            .field("pending", &self.pending_kinds())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    fn client() -> Client {
        Client::with_url("ws://127.0.0.1:1").expect("valid url")
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = client();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
        assert!(client.pending_kinds().is_empty());
        assert!(client.last_messages().is_empty());
    }

    #[test]
    fn test_requests_fail_when_not_connected() {
        let client = client();

        assert!(matches!(client.send_message("hi"), Err(Error::NotConnected)));
        assert!(matches!(client.get_message_size(), Err(Error::NotConnected)));
        assert!(matches!(
            client.send_auth_message("u", "p", "t"),
            Err(Error::NotConnected)
        ));
        assert!(matches!(client.register("u", "p"), Err(Error::NotConnected)));
        assert!(matches!(client.read_all_messages(), Err(Error::NotConnected)));
        assert!(matches!(
            client.read_chunked_messages(10),
            Err(Error::NotConnected)
        ));
        assert!(matches!(client.get_server_info(), Err(Error::NotConnected)));

        assert!(client.pending_kinds().is_empty());
    }

    #[test]
    fn test_dispatch_frame_publishes_push() {
        let client = client();
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen_clone = std::sync::Arc::clone(&seen);
        let id = client.subscribe(EventName::Messages, move |event| {
            seen_clone.lock().push(event.clone());
        });

        let outcome = client.dispatch_frame(b"<bob> hi\n".to_vec());
        assert!(outcome.resolved.is_empty());
        assert_eq!(client.last_messages(), vec!["<bob> hi"]);
        assert_eq!(
            *seen.lock(),
            vec![Event::Messages(vec!["<bob> hi".to_owned()])]
        );

        assert!(client.unsubscribe(EventName::Messages, id));
        client.dispatch_frame(b"again".to_vec());
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let client = client();
        let clone = client.clone();

        clone.dispatch_frame(b"shared".to_vec());
        assert_eq!(client.last_messages(), vec!["shared"]);
    }

    #[test]
    fn test_clients_are_independent() {
        let a = client();
        let b = client();

        a.dispatch_frame(b"only a".to_vec());
        assert!(b.last_messages().is_empty());
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("Disconnected"));
    }
}
