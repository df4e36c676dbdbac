//! Error types for the WebSocket utility client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use ws_utility_client::{ConnectionRegistry, Result};
//!
//! fn example(registry: &ConnectionRegistry) -> Result<()> {
//!     let id = registry.connect("wss://example.test/echo")?;
//!     registry.send(id, "hello")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Usage | [`Error::ConnectionNotFound`], [`Error::UnknownCommand`], [`Error::InvalidArgument`] |
//! | Transport | [`Error::InvalidUri`], [`Error::InvalidState`], [`Error::InvalidCloseCode`], [`Error::ConnectionClosed`], [`Error::Tls`] |
//! | Event loop | [`Error::EventLoopStopped`], [`Error::EventLoopPanicked`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Io`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::ConnectionId;
use crate::transport::LinkState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// No variant is fatal to the process: every error is reported to the
/// caller as a diagnostic and leaves the registry consistent.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// No connection is registered under this id.
    #[error("No connection found with id {id}")]
    ConnectionNotFound {
        /// The unknown connection id.
        id: ConnectionId,
    },

    /// Unrecognized shell command.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// The unrecognized command word.
        command: String,
    },

    /// Invalid argument to an operation or shell command.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// URI cannot be turned into a WebSocket connection.
    #[error("Invalid URI '{uri}': {message}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
        /// Why it was rejected.
        message: String,
    },

    /// Operation is not allowed in the connection's current state.
    #[error("Invalid state: cannot {operation} while connection is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// Link state at the time of the call.
        state: LinkState,
    },

    /// Close code may not be sent in a close frame.
    #[error("Invalid close code: {code}")]
    InvalidCloseCode {
        /// The rejected code.
        code: u16,
    },

    /// The connection's I/O task is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    /// TLS client configuration could not be produced.
    #[error("TLS setup failed: {message}")]
    Tls {
        /// Description of the TLS failure.
        message: String,
    },

    // ========================================================================
    // Event Loop Errors
    // ========================================================================
    /// Work was scheduled after the event loop was asked to stop.
    #[error("Event loop is stopped")]
    EventLoopStopped,

    /// The event loop thread panicked.
    #[error("Event loop thread panicked")]
    EventLoopPanicked,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection not found error.
    #[inline]
    pub fn connection_not_found(id: ConnectionId) -> Self {
        Self::ConnectionNotFound { id }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid URI error.
    #[inline]
    pub fn invalid_uri(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(operation: &'static str, state: LinkState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates an invalid close code error.
    #[inline]
    pub fn invalid_close_code(code: u16) -> Self {
        Self::InvalidCloseCode { code }
    }

    /// Creates a TLS setup error.
    #[inline]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the caller referenced something that does not exist
    /// or issued a malformed command.
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionNotFound { .. }
                | Self::UnknownCommand { .. }
                | Self::InvalidArgument { .. }
        )
    }

    /// Returns `true` if the transport rejected the operation.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUri { .. }
                | Self::InvalidState { .. }
                | Self::InvalidCloseCode { .. }
                | Self::ConnectionClosed
                | Self::Tls { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
