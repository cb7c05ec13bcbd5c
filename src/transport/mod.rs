//! WebSocket transport layer.
//!
//! This module handles the persistent connection between the client and
//! a wRAC server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │                              │  wRAC server    │
//! │                 │     WebSocket (binary)       │                 │
//! │  Connection     │◄────────────────────────────►│                 │
//! │  → Router       │      ws://host:port          │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::connect` - WebSocket handshake, `open` event
//! 2. Event loop - frames in order to the router, queued frames out
//! 3. `Connection::disconnect` - Close frame, `close` event
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionSettings, ConnectionState};
