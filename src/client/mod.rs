//! wRAC client module.
//!
//! This module provides the main entry point for talking to a server.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connection lifecycle, commands, events |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Transport tunables |
//!
//! # Example
//!
//! ```no_run
//! use wrac_client::{Client, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder().url("ws://127.0.0.1:42667").build()?;
//! client.connect().await?;
//!
//! client.send_message("hello")?;
//! let size = client.get_message_size()?.await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Transport options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::Client;
pub use options::ClientOptions;
