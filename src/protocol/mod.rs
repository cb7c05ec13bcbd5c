//! wRAC wire protocol types.
//!
//! This module defines the binary frames exchanged with a wRAC server.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`Command`] | Local → Server | Opcode-first request |
//! | [`InboundFrame`] | Server → Local | Reply or pushed messages |
//!
//! Replies carry no correlation ID. A reply is matched to a request by the
//! set of pending [`RequestKind`]s and the frame's shape.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound commands and encoding |
//! | `frame` | Inbound frame classification |
//! | `reply` | Resolved request values |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound commands and their binary layouts.
pub mod command;

/// Inbound frame classification.
pub mod frame;

/// Resolved request values.
pub mod reply;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, RequestKind};
pub use frame::{FrameKind, InboundFrame};
pub use reply::{AuthOutcome, RegisterOutcome, ServerInfo};
