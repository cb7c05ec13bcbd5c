//! Outbound commands and their binary layouts.
//!
//! Every command is opcode-first. There are no length prefixes and no
//! escaping: fields are joined with a single `\n` byte.
//!
//! # Layouts
//!
//! | Command | Bytes |
//! |---------|-------|
//! | `PlainMessage` | `01 ‖ text` |
//! | `AuthMessage` | `02 ‖ user ‖ 0A ‖ password ‖ 0A ‖ text` |
//! | `Register` | `03 ‖ user ‖ 0A ‖ password` |
//! | `GetSize` | `00` |
//! | `ReadAll` | `00 01` |
//! | `ReadChunked` | `00 02 ‖ ascii(last_size)` |
//! | `GetServerInfo` | `69` |
//!
//! Fields containing `\n` make the frame ambiguous on the wire.
//! This is a protocol limitation and is not validated here.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Opcode for reads (`GetSize`, `ReadAll`, `ReadChunked`).
pub const OP_READ: u8 = 0x00;

/// Opcode for an unauthenticated message.
pub const OP_PLAIN_MESSAGE: u8 = 0x01;

/// Opcode for an authenticated message.
pub const OP_AUTH_MESSAGE: u8 = 0x02;

/// Opcode for user registration.
pub const OP_REGISTER: u8 = 0x03;

/// Opcode for server info.
pub const OP_SERVER_INFO: u8 = 0x69;

/// Read sub-opcode selecting the full message history.
pub const READ_ALL: u8 = 0x01;

/// Read sub-opcode selecting history past a known size.
pub const READ_CHUNKED: u8 = 0x02;

/// Field separator.
pub const SEPARATOR: u8 = b'\n';

// ============================================================================
// RequestKind
// ============================================================================

/// Kinds of commands that expect exactly one reply.
///
/// `PlainMessage` is fire-and-forget and has no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    /// Authenticated message.
    AuthMessage,
    /// User registration.
    Register,
    /// Message history size.
    GetSize,
    /// Full message history.
    ReadAll,
    /// Message history past a known size.
    ReadChunked,
    /// Server version and name.
    GetServerInfo,
}

impl RequestKind {
    /// All request kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::AuthMessage,
        Self::Register,
        Self::GetSize,
        Self::ReadAll,
        Self::ReadChunked,
        Self::GetServerInfo,
    ];

    /// Returns the snake_case name used in logs and errors.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthMessage => "auth_message",
            Self::Register => "register",
            Self::GetSize => "get_size",
            Self::ReadAll => "read_all",
            Self::ReadChunked => "read_chunked",
            Self::GetServerInfo => "get_server_info",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Command
// ============================================================================

/// A single outbound command.
///
/// Constructed once per call and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// Message without authentication.
    PlainMessage {
        /// Message text.
        text: String,
    },

    /// Message signed with account credentials.
    AuthMessage {
        /// Account name.
        user: String,
        /// Account password.
        password: String,
        /// Message text.
        text: String,
    },

    /// Account registration.
    Register {
        /// Account name.
        user: String,
        /// Account password.
        password: String,
    },

    /// Query the message history size in bytes.
    GetSize,

    /// Read the whole message history.
    ReadAll,

    /// Read history appended after `last_size` bytes.
    ReadChunked {
        /// History size the caller already has.
        last_size: u64,
    },

    /// Query server version and name.
    GetServerInfo,
}

// ============================================================================
// Constructors
// ============================================================================

impl Command {
    /// Creates a plain message command.
    #[inline]
    #[must_use]
    pub fn plain_message(text: impl Into<String>) -> Self {
        Self::PlainMessage { text: text.into() }
    }

    /// Creates an authenticated message command.
    #[inline]
    #[must_use]
    pub fn auth_message(
        user: impl Into<String>,
        password: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::AuthMessage {
            user: user.into(),
            password: password.into(),
            text: text.into(),
        }
    }

    /// Creates a registration command.
    #[inline]
    #[must_use]
    pub fn register(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Register {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Creates a chunked read command.
    #[inline]
    #[must_use]
    pub const fn read_chunked(last_size: u64) -> Self {
        Self::ReadChunked { last_size }
    }
}

// ============================================================================
// Encoding
// ============================================================================

impl Command {
    /// Returns the request kind whose reply this command awaits.
    ///
    /// `None` for `PlainMessage`.
    #[inline]
    #[must_use]
    pub const fn reply_kind(&self) -> Option<RequestKind> {
        match self {
            Self::PlainMessage { .. } => None,
            Self::AuthMessage { .. } => Some(RequestKind::AuthMessage),
            Self::Register { .. } => Some(RequestKind::Register),
            Self::GetSize => Some(RequestKind::GetSize),
            Self::ReadAll => Some(RequestKind::ReadAll),
            Self::ReadChunked { .. } => Some(RequestKind::ReadChunked),
            Self::GetServerInfo => Some(RequestKind::GetServerInfo),
        }
    }

    /// Returns the first byte of the encoded command.
    #[inline]
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::PlainMessage { .. } => OP_PLAIN_MESSAGE,
            Self::AuthMessage { .. } => OP_AUTH_MESSAGE,
            Self::Register { .. } => OP_REGISTER,
            Self::GetSize | Self::ReadAll | Self::ReadChunked { .. } => OP_READ,
            Self::GetServerInfo => OP_SERVER_INFO,
        }
    }

    /// Encodes the command into its exact wire bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::PlainMessage { text } => {
                let mut buf = Vec::with_capacity(1 + text.len());
                buf.push(OP_PLAIN_MESSAGE);
                buf.extend_from_slice(text.as_bytes());
                buf
            }

            Self::AuthMessage {
                user,
                password,
                text,
            } => {
                let mut buf = Vec::with_capacity(3 + user.len() + password.len() + text.len());
                buf.push(OP_AUTH_MESSAGE);
                buf.extend_from_slice(user.as_bytes());
                buf.push(SEPARATOR);
                buf.extend_from_slice(password.as_bytes());
                buf.push(SEPARATOR);
                buf.extend_from_slice(text.as_bytes());
                buf
            }

            Self::Register { user, password } => {
                let mut buf = Vec::with_capacity(2 + user.len() + password.len());
                buf.push(OP_REGISTER);
                buf.extend_from_slice(user.as_bytes());
                buf.push(SEPARATOR);
                buf.extend_from_slice(password.as_bytes());
                buf
            }

            Self::GetSize => vec![OP_READ],

            Self::ReadAll => vec![OP_READ, READ_ALL],

            Self::ReadChunked { last_size } => {
                let digits = last_size.to_string();
                let mut buf = Vec::with_capacity(2 + digits.len());
                buf.push(OP_READ);
                buf.push(READ_CHUNKED);
                buf.extend_from_slice(digits.as_bytes());
                buf
            }

            Self::GetServerInfo => vec![OP_SERVER_INFO],
        }
    }
}

// Passwords stay out of logs and panic messages.
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainMessage { text } => f
                .debug_struct("PlainMessage")
                .field("text_len", &text.len())
                .finish(),
            Self::AuthMessage { user, text, .. } => f
                .debug_struct("AuthMessage")
                .field("user", user)
                .field("password", &"<redacted>")
                .field("text_len", &text.len())
                .finish(),
            Self::Register { user, .. } => f
                .debug_struct("Register")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Self::GetSize => f.write_str("GetSize"),
            Self::ReadAll => f.write_str("ReadAll"),
            Self::ReadChunked { last_size } => f
                .debug_struct("ReadChunked")
                .field("last_size", last_size)
                .finish(),
            Self::GetServerInfo => f.write_str("GetServerInfo"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
