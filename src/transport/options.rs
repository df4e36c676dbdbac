//! Per-connection transport options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ws_utility_client::transport::TransportOptions;
//!
//! let options = TransportOptions::new()
//!     .with_open_handshake_timeout(Duration::from_secs(10))
//!     .with_max_message_size(1 << 20);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

// ============================================================================
// Constants
// ============================================================================

/// Default limit for the opening handshake (TCP + TLS + HTTP upgrade).
pub const DEFAULT_OPEN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to wait for the peer to finish a closing handshake.
pub const DEFAULT_CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// TransportOptions
// ============================================================================

/// Options applied to every connection opened by a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Limit for the opening handshake.
    pub open_handshake_timeout: Duration,

    /// Limit for the closing handshake once a close frame was sent or
    /// received.
    pub close_handshake_timeout: Duration,

    /// Maximum incoming message size in bytes (`None` keeps the
    /// tungstenite default).
    pub max_message_size: Option<usize>,

    /// Disable Nagle's algorithm on the TCP socket.
    pub disable_nagle: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open_handshake_timeout: DEFAULT_OPEN_HANDSHAKE_TIMEOUT,
            close_handshake_timeout: DEFAULT_CLOSE_HANDSHAKE_TIMEOUT,
            max_message_size: None,
            disable_nagle: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportOptions {
    /// Sets the opening handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_open_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.open_handshake_timeout = timeout;
        self
    }

    /// Sets the closing handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_close_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.close_handshake_timeout = timeout;
        self
    }

    /// Sets the maximum incoming message size.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Enables or disables Nagle's algorithm.
    #[inline]
    #[must_use]
    pub fn with_nagle(mut self, enabled: bool) -> Self {
        self.disable_nagle = !enabled;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl TransportOptions {
    /// Builds the tungstenite protocol configuration.
    #[must_use]
    pub fn to_ws_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        if let Some(max) = self.max_message_size {
            config.max_message_size = Some(max);
        }
        config
    }
}

// ============================================================================
// Tests
// ============================================================================
