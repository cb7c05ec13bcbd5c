//! Inbound frame classification.
//!
//! Replies carry no request ID and no type tag. Decoding only describes the
//! shape of a frame; which request it answers is decided by the
//! [`Dispatcher`](crate::dispatch::Dispatcher) from the set of pending kinds.
//!
//! # Classification Order
//!
//! 1. Exactly one byte: `0x01` is [`FrameKind::NoUser`], `0x02` is
//!    [`FrameKind::BadPass`], anything else is [`FrameKind::Byte`] and is
//!    ignored by the dispatcher.
//! 2. Trimmed UTF-8 text made only of ASCII digits: [`FrameKind::Size`].
//! 3. Everything else: [`FrameKind::Payload`].
//!
//! A payload is read either as a message list or as server info, depending
//! on what is pending.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::command::SEPARATOR;
use super::reply::ServerInfo;

// ============================================================================
// Constants
// ============================================================================

/// Single-byte reply: user does not exist (or name taken, for registration).
pub const ERROR_NO_USER: u8 = 0x01;

/// Single-byte reply: wrong password.
pub const ERROR_BAD_PASS: u8 = 0x02;

/// Matches a whole frame of ASCII digits.
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digit pattern is valid"));

// ============================================================================
// FrameKind
// ============================================================================

/// Shape of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Single byte `0x01`.
    NoUser,
    /// Single byte `0x02`.
    BadPass,
    /// Any other single byte. Unclassified; never dispatched.
    Byte(u8),
    /// Digits-only text, parsed.
    Size(u64),
    /// Anything else.
    Payload,
}

// ============================================================================
// InboundFrame
// ============================================================================

/// A binary frame received from the server, with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Raw frame bytes.
    bytes: Vec<u8>,
    /// Shape computed at decode time.
    kind: FrameKind,
}

impl InboundFrame {
    /// Decodes raw bytes into a classified frame.
    ///
    /// Pure; never fails. Invalid UTF-8 is decoded lossily.
    #[must_use]
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let kind = classify(&bytes);
        Self { bytes, kind }
    }

    /// Returns the frame classification.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the frame length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the frame has no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the frame as newline-delimited messages.
    ///
    /// The decoded text is trimmed as a whole before splitting, so padding
    /// around the frame never reaches the first or last message. Empty
    /// lines are dropped; line order is kept.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.bytes)
            .trim()
            .split(char::from(SEPARATOR))
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Decodes the frame as `version ‖ name`.
    ///
    /// Returns `None` for frames shorter than two bytes.
    #[must_use]
    pub fn server_info(&self) -> Option<ServerInfo> {
        match self.bytes.split_first() {
            Some((&version, name)) if !name.is_empty() => Some(ServerInfo {
                version,
                name: String::from_utf8_lossy(name).into_owned(),
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

fn classify(bytes: &[u8]) -> FrameKind {
    if let [byte] = bytes {
        return match *byte {
            ERROR_NO_USER => FrameKind::NoUser,
            ERROR_BAD_PASS => FrameKind::BadPass,
            other => FrameKind::Byte(other),
        };
    }

    let text: Cow<'_, str> = String::from_utf8_lossy(bytes);
    let text = text.trim();

    if DIGITS.is_match(text)
        && let Ok(size) = text.parse::<u64>()
    {
        return FrameKind::Size(size);
    }

    FrameKind::Payload
}

// ============================================================================
// Tests
// ============================================================================
