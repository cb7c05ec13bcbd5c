//! WebSocket connection and event loop.
//!
//! This module owns the transport lifecycle and translates its signals:
//!
//! | Transport signal | Effect |
//! |------------------|--------|
//! | handshake done | `open` event |
//! | binary frame | dispatched to the router |
//! | text frame | ignored |
//! | close / stream end | `close` event |
//! | read or write error | `error` event, then `close` |
//!
//! # Event Loop
//!
//! Each open connection spawns one tokio task that handles:
//!
//! - Incoming frames, dispatched strictly in arrival order
//! - Outgoing frames queued by the client API
//! - Shutdown requests from [`Connection::disconnect`]
//!
//! # Connect Races
//!
//! Every connect attempt gets an epoch. `disconnect()` during a handshake
//! bumps the epoch; the handshake result is then discarded and `open` is
//! never published.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::dispatch::Router;
use crate::error::{Error, Result};
use crate::events::Event;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Frames may be sent.
    Open,
    /// Close requested, waiting for the event loop to finish.
    Closing,
}

impl ConnectionState {
    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send one binary frame.
    Send(Vec<u8>),
    /// Close the WebSocket.
    Shutdown,
}

// ============================================================================
// Link
// ============================================================================

/// Mutable lifecycle state shared with the event loop.
struct Link {
    state: ConnectionState,
    epoch: u64,
    command_tx: Option<mpsc::UnboundedSender<ConnectionCommand>>,
}

impl Link {
    const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            epoch: 0,
            command_tx: None,
        }
    }
}

// ============================================================================
// ConnectionSettings
// ============================================================================

/// Transport settings taken from the client configuration.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Server URL (`ws` or `wss`).
    pub url: Url,
    /// Maximum time to wait for the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Maximum accepted frame and message size.
    pub max_frame_size: usize,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket transport adapter for one client.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. Sending never blocks: frames are queued
/// to the event loop task.
pub struct Connection {
    /// Where and how to connect.
    settings: ConnectionSettings,
    /// Lifecycle state (shared with event loop).
    link: Arc<Mutex<Link>>,
    /// Dispatcher and event bus (shared with event loop).
    router: Arc<Router>,
}

impl Connection {
    /// Creates a disconnected transport.
    pub(crate) fn new(settings: ConnectionSettings, router: Arc<Router>) -> Self {
        Self {
            settings,
            link: Arc::new(Mutex::new(Link::new())),
            router,
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.link.lock().state
    }

    /// Returns `true` if frames may be sent.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Returns the server URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.settings.url
    }

    /// Opens the WebSocket connection.
    ///
    /// No-op while already connecting or open.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds the timeout
    /// - [`Error::WebSocket`] if the handshake fails
    /// - [`Error::Connection`] if a close is in progress
    /// - [`Error::ConnectAborted`] if `disconnect()` was called meanwhile
    pub async fn connect(&self) -> Result<()> {
        let epoch = {
            let mut link = self.link.lock();
            match link.state {
                ConnectionState::Open | ConnectionState::Connecting => {
                    debug!(state = %link.state, "Connect ignored");
                    return Ok(());
                }
                ConnectionState::Closing => {
                    return Err(Error::connection("previous connection is still closing"));
                }
                ConnectionState::Disconnected => {}
            }
            link.epoch += 1;
            link.state = ConnectionState::Connecting;
            link.epoch
        };

        debug!(url = %self.settings.url, epoch, "Connecting");

        let config = WebSocketConfig::default()
            .max_frame_size(Some(self.settings.max_frame_size))
            .max_message_size(Some(self.settings.max_frame_size));

        let handshake = timeout(
            self.settings.connect_timeout,
            connect_async_with_config(self.settings.url.as_str(), Some(config), false),
        )
        .await;

        let ws_stream = match handshake {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => return Err(self.fail_connect(epoch, Error::WebSocket(e))),
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.settings.connect_timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(self.fail_connect(epoch, Error::connection_timeout(timeout_ms)));
            }
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        {
            let mut link = self.link.lock();
            if link.epoch != epoch || link.state != ConnectionState::Connecting {
                debug!(epoch, "Connect superseded by disconnect, discarding stream");
                drop(link);
                tokio::spawn(async move {
                    let mut ws_stream = ws_stream;
                    let _ = ws_stream.close(None).await;
                });
                return Err(Error::ConnectAborted);
            }
            link.state = ConnectionState::Open;
            link.command_tx = Some(command_tx);
        }

        info!(url = %self.settings.url, "wRAC connection established");
        self.router.publish(&Event::Open);

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            epoch,
            Arc::clone(&self.link),
            Arc::clone(&self.router),
        ));

        Ok(())
    }

    /// Closes the connection.
    ///
    /// During a handshake, the attempt is abandoned and `open` is never
    /// published. Pending requests are left untouched.
    pub fn disconnect(&self) {
        let mut link = self.link.lock();
        match link.state {
            ConnectionState::Connecting => {
                link.epoch += 1;
                link.state = ConnectionState::Disconnected;
                debug!("Disconnect during handshake");
            }
            ConnectionState::Open => {
                link.state = ConnectionState::Closing;
                if let Some(tx) = &link.command_tx {
                    let _ = tx.send(ConnectionCommand::Shutdown);
                }
                debug!("Disconnect requested");
            }
            ConnectionState::Closing | ConnectionState::Disconnected => {}
        }
    }

    /// Queues one binary frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the state is not `Open`
    /// - [`Error::ConnectionClosed`] if the event loop is gone
    pub fn send(&self, bytes: Vec<u8>) -> Result<()> {
        let link = self.link.lock();
        if link.state != ConnectionState::Open {
            return Err(Error::NotConnected);
        }

        let tx = link.command_tx.as_ref().ok_or(Error::NotConnected)?;
        let len = bytes.len();
        tx.send(ConnectionCommand::Send(bytes))
            .map_err(|_| Error::ConnectionClosed)?;

        trace!(len, "Frame queued");
        Ok(())
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        epoch: u64,
        link: Arc<Mutex<Link>>,
        router: Arc<Router>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut close_reason: Option<String> = None;

        loop {
            tokio::select! {
                // Incoming frames from server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Binary(data))) => {
                            router.route(data.to_vec());
                        }

                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Ignoring text frame");
                        }

                        Some(Ok(Message::Close(frame))) => {
                            close_reason = frame.map(describe_close);
                            debug!(reason = ?close_reason, "WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            router.publish(&Event::Error { message: e.to_string() });
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ping, Pong, raw frames
                        _ => {}
                    }
                }

                // Commands from client API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(bytes)) => {
                            if let Err(e) = ws_write.send(Message::Binary(bytes.into())).await {
                                warn!(error = %e, "Failed to send frame");
                                router.publish(&Event::Error { message: e.to_string() });
                                break;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        let current = {
            let mut link = link.lock();
            let current = link.epoch == epoch;
            if current {
                link.state = ConnectionState::Disconnected;
                link.command_tx = None;
            }
            current
        };

        if current {
            router.publish(&Event::Close {
                reason: close_reason,
            });
        }

        debug!(epoch, current, "Event loop terminated");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.settings.url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // The loop holds the link, so dropping the sender alone cannot stop it.
        self.disconnect();
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Connection {
    /// Records a failed handshake and returns the error to report.
    fn fail_connect(&self, epoch: u64, err: Error) -> Error {
        let mut link = self.link.lock();
        if link.epoch != epoch {
            debug!(epoch, error = %err, "Abandoned handshake failed");
            return Error::ConnectAborted;
        }

        link.state = ConnectionState::Disconnected;
        drop(link);

        warn!(error = %err, "Connect failed");
        self.router.publish(&Event::Error {
            message: err.to_string(),
        });
        err
    }
}

fn describe_close(frame: CloseFrame) -> String {
    let reason = frame.reason.as_str();
    if reason.is_empty() {
        format!("code {}", u16::from(frame.code))
    } else {
        reason.to_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================
