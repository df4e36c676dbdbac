//! Close codes and close-reason formatting.
//!
//! Close codes are the RFC 6455 status codes exchanged in close frames.
//! This module names them for display, decides which ones a client may put
//! in a close frame, and builds the text stored on a record when a
//! connection closes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Normal closure.
pub const NORMAL: u16 = 1000;

/// Endpoint is going away (shutdown, navigation).
pub const GOING_AWAY: u16 = 1001;

/// Connection dropped without a close frame.
pub const ABNORMAL: u16 = 1006;

/// Maximum close reason length in bytes (125-byte control payload minus
/// the 2-byte code).
pub const MAX_REASON_LEN: usize = 123;

// ============================================================================
// Code Names
// ============================================================================

/// Returns the human-readable name of a close code.
#[must_use]
pub fn code_name(code: u16) -> &'static str {
    match code {
        1000 => "Normal close",
        1001 => "Going away",
        1002 => "Protocol error",
        1003 => "Unsupported data",
        1005 => "No status set",
        1006 => "Abnormal close",
        1007 => "Invalid payload",
        1008 => "Policy violation",
        1009 => "Message too big",
        1010 => "Extension required",
        1011 => "Internal endpoint error",
        1012 => "Service restart",
        1013 => "Try again later",
        1015 => "TLS handshake failure",
        _ => "Unknown",
    }
}

/// Checks that `code` and `reason` can be sent in a close frame.
///
/// # Errors
///
/// - [`Error::InvalidCloseCode`] for codes reserved for local use
///   (1005, 1006, 1015), the reserved range, and codes below 1000
/// - [`Error::InvalidArgument`] if `reason` exceeds [`MAX_REASON_LEN`] bytes
pub fn validate(code: u16, reason: &str) -> Result<()> {
    if !CloseCode::from(code).is_allowed() {
        return Err(Error::invalid_close_code(code));
    }

    if reason.len() > MAX_REASON_LEN {
        return Err(Error::invalid_argument(format!(
            "close reason is {} bytes, limit is {MAX_REASON_LEN}",
            reason.len()
        )));
    }

    Ok(())
}

// ============================================================================
// CloseInfo
// ============================================================================

/// Close code and reason reported by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// Remote close code.
    pub code: u16,
    /// Remote reason text (may be empty).
    pub reason: String,
}

impl CloseInfo {
    /// Creates close info from a code and reason.
    #[inline]
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Close info for a connection that ended without a close frame.
    #[inline]
    #[must_use]
    pub fn abnormal() -> Self {
        Self::new(ABNORMAL, String::new())
    }

    /// Returns the name of the close code.
    #[inline]
    #[must_use]
    pub fn code_name(&self) -> &'static str {
        code_name(self.code)
    }
}

impl fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "close code: {} ({}), close reason: {}",
            self.code,
            self.code_name(),
            self.reason
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
