//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wrac_client::Client;
//!
//! # fn example() -> wrac_client::Result<()> {
//! let client = Client::builder()
//!     .url("ws://chat.example.org:42667")
//!     .connect_timeout(Duration::from_secs(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::core::Client;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    /// Server URL, unparsed.
    url: Option<String>,
    /// Transport options.
    options: ClientOptions,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with default options and no URL.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server URL (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Sets the maximum inbound frame size.
    #[inline]
    #[must_use]
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.options.max_frame_size = bytes;
        self
    }

    /// Replaces all transport options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the client with validation. Does not connect.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is missing or not `ws`/`wss`
    /// - [`Error::InvalidUrl`] if the URL does not parse
    /// - [`Error::Config`] if a timeout or size is zero
    pub fn build(self) -> Result<Client> {
        let url = self.validate_url()?;
        let options = self.validate_options()?;

        Ok(Client::new(url, options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the server URL.
    fn validate_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Server URL is required. Use .url() to set it.\n\
                 Example: Client::builder().url(\"ws://127.0.0.1:42667\")",
            )
        })?;

        let url = Url::parse(raw)?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::config(format!(
                    "Unsupported URL scheme '{other}', expected ws or wss"
                )));
            }
        }

        if url.host_str().is_none() {
            return Err(Error::config(format!("URL has no host: {url}")));
        }

        Ok(url)
    }

    /// Validates the transport options.
    fn validate_options(&self) -> Result<ClientOptions> {
        if self.options.connect_timeout.is_zero() {
            return Err(Error::config("Connect timeout must be greater than zero"));
        }

        if self.options.max_frame_size == 0 {
            return Err(Error::config("Maximum frame size must be greater than zero"));
        }

        Ok(self.options.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ClientBuilder::new();
        assert!(builder.url.is_none());
        assert_eq!(builder.options, ClientOptions::default());
    }

    #[test]
    fn test_url_sets_value() {
        let builder = ClientBuilder::new().url("ws://127.0.0.1:42667");
        assert_eq!(builder.url.as_deref(), Some("ws://127.0.0.1:42667"));
    }

    #[test]
    fn test_option_setters() {
        let builder = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(3))
            .max_frame_size(512);
        assert_eq!(builder.options.connect_timeout, Duration::from_secs(3));
        assert_eq!(builder.options.max_frame_size, 512);
    }

    #[test]
    fn test_build_fails_without_url() {
        let err = ClientBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("URL is required"));
    }

    #[test]
    fn test_build_fails_with_bad_scheme() {
        let err = ClientBuilder::new()
            .url("http://127.0.0.1:42667")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_build_fails_with_unparsable_url() {
        let err = ClientBuilder::new().url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_build_fails_with_zero_timeout() {
        let err = ClientBuilder::new()
            .url("ws://127.0.0.1:42667")
            .connect_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_build_fails_with_zero_frame_size() {
        let result = ClientBuilder::new()
            .url("wss://chat.example.org")
            .max_frame_size(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_succeeds() {
        let client = ClientBuilder::new()
            .url("wss://chat.example.org:42667")
            .build()
            .expect("valid config");
        assert_eq!(client.url().as_str(), "wss://chat.example.org:42667/");
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = ClientBuilder::new().url("ws://a");
        let cloned = builder.clone();
        assert_eq!(builder.url, cloned.url);
    }
}
