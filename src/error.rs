//! Error types for the wRAC client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use wrac_client::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let size = client.get_message_size()?.await?;
//!     println!("{size} bytes of history");
//!     Ok(())
//! }
//! ```
//!
//! Authentication failures (`no_user`, `bad_pass`, `username_taken`) are
//! not errors. They are the resolved value of the request, see
//! [`AuthOutcome`](crate::protocol::AuthOutcome) and
//! [`RegisterOutcome`](crate::protocol::RegisterOutcome).
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectAborted`], [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | Request | [`Error::Orphaned`] |
//! | External | [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError;

use crate::protocol::RequestKind;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Server URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection attempt rejected by the client state.
    ///
    /// Returned when `connect()` is called while a close is in progress.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout waiting for the server.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connect attempt superseded by `disconnect()`.
    ///
    /// The handshake finished after the caller asked to disconnect,
    /// so the fresh connection was discarded without publishing `open`.
    #[error("Connect aborted by disconnect")]
    ConnectAborted,

    /// Send attempted while the connection is not open.
    ///
    /// Raised synchronously. Not retried; the caller must reconnect.
    #[error("Not connected")]
    NotConnected,

    /// WebSocket connection closed unexpectedly.
    ///
    /// Returned when the event loop is gone while a frame is queued.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Pending request lost its resolver before any reply arrived.
    ///
    /// Happens when a second request of the same kind replaced it,
    /// when it was dropped with `forget`, or when the client was dropped.
    #[error("Request orphaned: {kind}")]
    Orphaned {
        /// Kind of the request that lost its resolver.
        kind: RequestKind,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket handshake or I/O failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates an orphaned request error.
    #[inline]
    pub fn orphaned(kind: RequestKind) -> Self {
        Self::Orphaned { kind }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectAborted
                | Self::NotConnected
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the request lost its resolver.
    #[inline]
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        matches!(self, Self::Orphaned { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing url");
        assert_eq!(err.to_string(), "Configuration error: missing url");
    }

    #[test]
    fn test_orphaned_display() {
        let err = Error::orphaned(RequestKind::GetSize);
        assert_eq!(err.to_string(), "Request orphaned: get_size");
        assert!(err.is_orphaned());
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::connection_timeout(5000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::connection_timeout(1000).is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::ConnectAborted.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::orphaned(RequestKind::ReadAll).is_connection_error());
    }

    #[test]
    fn test_from_websocket_error() {
        let err: Error = WsError::ConnectionClosed.into();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_from_url_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
