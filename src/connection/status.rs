//! Connection status as seen by the command thread.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Lifecycle status recorded for a connection.
///
/// ```text
/// Connecting ──► Open ──► Closed
///     │            │
///     └──► Failed ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    /// Handshake in progress.
    #[default]
    Connecting,
    /// Handshake succeeded.
    Open,
    /// Handshake or transport failed.
    Failed,
    /// Closed after being open.
    Closed,
}

impl ConnectionStatus {
    /// Returns `true` for `Failed` and `Closed`.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    /// Returns `true` if the status may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open | Self::Failed) | (Self::Open, Self::Closed | Self::Failed)
        )
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Open => "Open",
            Self::Failed => "Failed",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
