//! Values a pending request resolves with.
//!
//! Authentication failures are ordinary outcomes here, not errors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// AuthOutcome
// ============================================================================

/// Outcome of an authenticated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
    /// No error frame arrived before another reply.
    Ok,
    /// Server answered `0x01`: unknown user.
    NoUser,
    /// Server answered `0x02`: wrong password.
    BadPass,
}

impl AuthOutcome {
    /// Returns the protocol name of the outcome.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoUser => "no_user",
            Self::BadPass => "bad_pass",
        }
    }

    /// Returns `true` for [`AuthOutcome::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RegisterOutcome
// ============================================================================

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterOutcome {
    /// No error frame arrived before another reply.
    Ok,
    /// Server answered `0x01`: name already registered.
    UsernameTaken,
}

impl RegisterOutcome {
    /// Returns the protocol name of the outcome.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::UsernameTaken => "username_taken",
        }
    }

    /// Returns `true` for [`RegisterOutcome::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ServerInfo
// ============================================================================

/// Server version byte and display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerInfo {
    /// Protocol version byte.
    pub version: u8,
    /// Server name.
    pub name: String,
}

impl ServerInfo {
    /// Creates server info.
    #[inline]
    #[must_use]
    pub fn new(version: u8, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
        }
    }
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", self.name, self.version)
    }
}

// ============================================================================
// Tests
// ============================================================================
