//! Client events and their fan-out.
//!
//! # Events
//!
//! | Name | Payload | Published when |
//! |------|---------|----------------|
//! | `open` | none | WebSocket handshake completed |
//! | `close` | optional reason | connection ended |
//! | `error` | message | connect or transport failure |
//! | `messages` | message list | read reply or server push |
//!
//! Transport faults surface only here. They never reject pending requests.

// ============================================================================
// Submodules
// ============================================================================

/// Ordered synchronous publish/subscribe.
pub mod bus;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{EventBus, EventHandler};

// ============================================================================
// EventName
// ============================================================================

/// Name under which handlers subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Connection opened.
    Open,
    /// Connection closed.
    Close,
    /// Transport error.
    Error,
    /// Message list delivered.
    Messages,
}

impl EventName {
    /// Returns the event name string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Error => "error",
            Self::Messages => "messages",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event
// ============================================================================

/// An event published by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Connection opened.
    Open,

    /// Connection closed.
    Close {
        /// Close reason from the server or the client, if any.
        reason: Option<String>,
    },

    /// Transport error.
    Error {
        /// Error description.
        message: String,
    },

    /// Message list from a read reply or a server push.
    Messages(Vec<String>),
}

impl Event {
    /// Returns the name handlers subscribe under.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> EventName {
        match self {
            Self::Open => EventName::Open,
            Self::Close { .. } => EventName::Close,
            Self::Error { .. } => EventName::Error,
            Self::Messages(_) => EventName::Messages,
        }
    }

    /// Returns the message list for `messages` events.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            Self::Messages(messages) => Some(messages),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::Open.name(), EventName::Open);
        assert_eq!(Event::Close { reason: None }.name(), EventName::Close);
        assert_eq!(
            Event::Error {
                message: "boom".into()
            }
            .name(),
            EventName::Error
        );
        assert_eq!(Event::Messages(vec![]).name().to_string(), "messages");
    }

    #[test]
    fn test_messages_accessor() {
        let event = Event::Messages(vec!["a".into()]);
        assert_eq!(event.messages(), Some(&["a".to_owned()][..]));
        assert!(Event::Open.messages().is_none());
    }
}
