//! wRAC client - async client for the binary wRAC chat protocol.
//!
//! wRAC carries RAC chat commands as binary WebSocket frames over one
//! persistent connection.
//!
//! # Architecture
//!
//! Replies carry no request ID or type tag. The client correlates them by
//! what is outstanding:
//!
//! - At most one request per [`RequestKind`] is pending at a time
//! - Each inbound frame is classified by length and content
//! - A fixed priority order picks the request it resolves
//! - Anything unmatched is a pushed message list (`messages` event)
//!
//! # Quick Start
//!
//! ```no_run
//! use wrac_client::{Client, EventName, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder().url("ws://127.0.0.1:42667").build()?;
//!
//!     client.subscribe(EventName::Messages, |event| {
//!         println!("{:?}", event.messages());
//!     });
//!
//!     client.connect().await?;
//!
//!     let info = client.get_server_info()?.await?;
//!     println!("Server: {info}");
//!
//!     client.send_message("hello from rust")?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], [`ClientBuilder`], [`ClientOptions`] |
//! | [`dispatch`] | Pending table and frame demultiplexer |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | [`Event`], [`EventName`], [`EventBus`] |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire commands and frame classification |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Client entry point and configuration.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Request/response correlation.
///
/// The pending request table and the priority-ordered dispatcher.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Client events and publish/subscribe.
pub mod events;

/// Type-safe identifiers.
pub mod identifiers;

/// wRAC wire protocol types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ClientOptions};

// Dispatch types
pub use dispatch::{DispatchOutcome, Dispatcher, Pending};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{Event, EventBus, EventName};

// Identifier types
pub use identifiers::SubscriptionId;

// Protocol types
pub use protocol::{
    AuthOutcome, Command, FrameKind, InboundFrame, RegisterOutcome, RequestKind, ServerInfo,
};

// Transport types
pub use transport::ConnectionState;
