//! Builder pattern for registry configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ws_utility_client::ConnectionRegistry;
//!
//! # fn example() -> ws_utility_client::Result<()> {
//! let registry = ConnectionRegistry::builder()
//!     .thread_name("ws-io")
//!     .open_handshake_timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::event_loop::DEFAULT_THREAD_NAME;
use crate::transport::{DefaultSecureTransport, SecureTransportFactory, TransportOptions};

use super::core::ConnectionRegistry;

// ============================================================================
// RegistryBuilder
// ============================================================================

/// Builder for configuring a [`ConnectionRegistry`].
///
/// Use [`ConnectionRegistry::builder()`] to create a new builder.
#[derive(Clone)]
pub struct RegistryBuilder {
    /// Name of the event loop thread.
    thread_name: String,
    /// Options applied to every connection.
    options: TransportOptions,
    /// TLS factory; native roots when unset.
    secure_transport: Option<Arc<dyn SecureTransportFactory>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            options: TransportOptions::new(),
            secure_transport: None,
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("thread_name", &self.thread_name)
            .field("options", &self.options)
            .field("custom_secure_transport", &self.secure_transport.is_some())
            .finish()
    }
}

// ============================================================================
// RegistryBuilder Implementation
// ============================================================================

impl RegistryBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event loop thread name.
    #[inline]
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the opening handshake timeout.
    #[inline]
    #[must_use]
    pub fn open_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_open_handshake_timeout(timeout);
        self
    }

    /// Sets the closing handshake timeout.
    #[inline]
    #[must_use]
    pub fn close_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_close_handshake_timeout(timeout);
        self
    }

    /// Sets the maximum incoming message size in bytes.
    #[inline]
    #[must_use]
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.options = self.options.with_max_message_size(bytes);
        self
    }

    /// Disables (`true`) or enables Nagle's algorithm.
    #[inline]
    #[must_use]
    pub fn disable_nagle(mut self, disable: bool) -> Self {
        self.options = self.options.with_nagle(!disable);
        self
    }

    /// Sets the TLS configuration factory for `wss://` connections.
    #[inline]
    #[must_use]
    pub fn secure_transport(mut self, factory: Arc<dyn SecureTransportFactory>) -> Self {
        self.secure_transport = Some(factory);
        self
    }

    /// Validates the configuration and starts the event loop.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for an empty thread name, a zero timeout, or a
    ///   zero message size limit
    /// - [`Error::Io`] if the event loop cannot be started
    pub fn build(self) -> Result<ConnectionRegistry> {
        self.validate()?;

        let security = self
            .secure_transport
            .unwrap_or_else(|| Arc::new(DefaultSecureTransport::new()));

        ConnectionRegistry::start(&self.thread_name, self.options, security)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl RegistryBuilder {
    fn validate(&self) -> Result<()> {
        if self.thread_name.trim().is_empty() {
            return Err(Error::config("Event loop thread name must not be empty"));
        }

        if self.options.open_handshake_timeout.is_zero() {
            return Err(Error::config("Open handshake timeout must be greater than zero"));
        }

        if self.options.close_handshake_timeout.is_zero() {
            return Err(Error::config("Close handshake timeout must be greater than zero"));
        }

        if self.options.max_message_size == Some(0) {
            return Err(Error::config("Maximum message size must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let builder = RegistryBuilder::new();
        assert_eq!(builder.thread_name, DEFAULT_THREAD_NAME);
        assert_eq!(builder.options, TransportOptions::default());
        assert!(builder.secure_transport.is_none());
    }

    #[test]
    fn test_setters_reach_transport_options() {
        let builder = RegistryBuilder::new()
            .thread_name("io")
            .open_handshake_timeout(Duration::from_millis(300))
            .close_handshake_timeout(Duration::from_millis(200))
            .max_message_size(1024)
            .disable_nagle(false);

        assert_eq!(builder.thread_name, "io");
        assert_eq!(builder.options.open_handshake_timeout, Duration::from_millis(300));
        assert_eq!(builder.options.close_handshake_timeout, Duration::from_millis(200));
        assert_eq!(builder.options.max_message_size, Some(1024));
        assert!(!builder.options.disable_nagle);
    }

    #[test]
    fn test_zero_timeout_is_config_error() {
        let err = RegistryBuilder::new()
            .open_handshake_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = RegistryBuilder::new()
            .close_handshake_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Close handshake timeout"));
    }

    #[test]
    fn test_empty_thread_name_is_config_error() {
        let err = RegistryBuilder::new().thread_name("  ").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_zero_message_size_is_config_error() {
        let err = RegistryBuilder::new().max_message_size(0).build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
