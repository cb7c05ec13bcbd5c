//! Client connection options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use wrac_client::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_max_frame_size(1024 * 1024);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum frame size (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

// ============================================================================
// ClientOptions
// ============================================================================

/// Tunables for the WebSocket transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Maximum time to wait for the WebSocket handshake.
    pub connect_timeout: Duration,

    /// Largest inbound frame accepted. Full history reads can be large.
    pub max_frame_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum inbound frame size.
    #[inline]
    #[must_use]
    pub const fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
